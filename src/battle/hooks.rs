//! Battle lifecycle hooks.
//!
//! The engine calls `BattleHooks` at fixed points of each turn. Hosts put
//! their combat bookkeeping here (start-of-turn effects, end-of-turn
//! effects, death checks). Every method has a default that only logs, so
//! implementors override what they need.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::TurnOwner;

use super::state::BattleState;

/// Participants and arena for a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSetup {
    pub player: Option<String>,
    pub enemies: Vec<String>,
    pub biome: String,
}

impl Default for BattleSetup {
    fn default() -> Self {
        Self {
            player: None,
            enemies: Vec::new(),
            biome: "none".to_string(),
        }
    }
}

impl BattleSetup {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    #[must_use]
    pub fn with_enemy(mut self, enemy: impl Into<String>) -> Self {
        self.enemies.push(enemy.into());
        self
    }

    #[must_use]
    pub fn with_biome(mut self, biome: impl Into<String>) -> Self {
        self.biome = biome.into();
        self
    }
}

/// Callbacks invoked by the turn engine.
///
/// ## Call order per turn
///
/// 1. `start_turn`
/// 2. `roll_effects` once the die lands
/// 3. `death_check` after the spell animation
/// 4. `end_turn_effects`, then `death_check` again
///
/// `on_transition` runs after every state change, including the ones
/// above.
pub trait BattleHooks {
    /// Called once when the session starts.
    fn start_battle(&mut self, setup: &BattleSetup) {
        info!(
            player = ?setup.player,
            enemies = ?setup.enemies,
            biome = %setup.biome,
            "checking start battle effects"
        );
    }

    fn start_turn(&mut self, owner: TurnOwner) {
        info!(%owner, "checking start turn effects");
    }

    fn roll_effects(&mut self, owner: TurnOwner, roll: u8) {
        info!(%owner, roll, "checking roll effects");
    }

    fn end_turn_effects(&mut self, owner: TurnOwner) {
        info!(%owner, "checking end turn effects");
    }

    /// Whether a combatant has died. Returning true ends the session.
    fn death_check(&mut self) -> bool {
        debug!("checked for death");
        false
    }

    fn on_transition(&mut self, _state: &BattleState) {}
}

impl<H: BattleHooks + ?Sized> BattleHooks for &mut H {
    fn start_battle(&mut self, setup: &BattleSetup) {
        (**self).start_battle(setup);
    }

    fn start_turn(&mut self, owner: TurnOwner) {
        (**self).start_turn(owner);
    }

    fn roll_effects(&mut self, owner: TurnOwner, roll: u8) {
        (**self).roll_effects(owner, roll);
    }

    fn end_turn_effects(&mut self, owner: TurnOwner) {
        (**self).end_turn_effects(owner);
    }

    fn death_check(&mut self) -> bool {
        (**self).death_check()
    }

    fn on_transition(&mut self, state: &BattleState) {
        (**self).on_transition(state);
    }
}

impl<H: BattleHooks + ?Sized> BattleHooks for Box<H> {
    fn start_battle(&mut self, setup: &BattleSetup) {
        (**self).start_battle(setup);
    }

    fn start_turn(&mut self, owner: TurnOwner) {
        (**self).start_turn(owner);
    }

    fn roll_effects(&mut self, owner: TurnOwner, roll: u8) {
        (**self).roll_effects(owner, roll);
    }

    fn end_turn_effects(&mut self, owner: TurnOwner) {
        (**self).end_turn_effects(owner);
    }

    fn death_check(&mut self) -> bool {
        (**self).death_check()
    }

    fn on_transition(&mut self, state: &BattleState) {
        (**self).on_transition(state);
    }
}

/// Hooks that only log. Nobody ever dies.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHooks;

impl BattleHooks for LoggingHooks {}
