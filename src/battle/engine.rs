//! The turn engine: a phase state machine over a virtual clock.
//!
//! ## Turn sequence
//!
//! ```text
//! StartTurn ──roll──▶ TriggerSpell ──spell──▶ Animating ──▶ EndTurn ──confirm──▶ StartTurn (other side)
//! ```
//!
//! The player side waits for [`BattleEvent`]s at StartTurn, TriggerSpell
//! and EndTurn. The enemy side rolls and triggers on its own and only
//! waits at EndTurn. The three pacing delays are scheduled continuations
//! that fire when the host advances the clock.
//!
//! A death check after the animation, or after end-of-turn effects, ends
//! the session early.
//!
//! ## Usage
//!
//! ```
//! use spell_battle::battle::{BattleEvent, BattleSetup, EngineStatus, TurnEngine};
//! use spell_battle::core::{BattleConfig, TurnOwner};
//! use spell_battle::effects::EffectCode;
//!
//! let mut engine = TurnEngine::from_config(BattleConfig::default());
//! assert_eq!(engine.start(BattleSetup::default()), Ok(EngineStatus::AwaitingRoll));
//!
//! engine.handle(BattleEvent::RollRequested(TurnOwner::Player)).unwrap();
//! assert_eq!(engine.advance(1000), EngineStatus::AwaitingEffect);
//!
//! engine.handle(BattleEvent::EffectTriggered(EffectCode::new("ATT{R2}-111"))).unwrap();
//! assert_eq!(engine.run_until_idle(), EngineStatus::AwaitingConfirm);
//! assert_eq!(engine.handler().len(), 1);
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{clamp_face, BattleConfig, BattleRng, DieRoller, TurnOwner};
use crate::effects::{CallerContext, DecodeOutcome, EffectCode, EffectDecoder, EffectHandler, EffectLog};

use super::hooks::{BattleHooks, BattleSetup, LoggingHooks};
use super::schedule::{Continuation, Scheduled, VirtualClock};
use super::state::{BattlePhase, BattleState};

/// Input from the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// The given side asks to roll its die.
    RollRequested(TurnOwner),
    /// The player triggers a spell.
    EffectTriggered(EffectCode),
    /// The end of turn is acknowledged.
    EndTurnConfirmed,
}

impl BattleEvent {
    fn name(&self) -> &'static str {
        match self {
            BattleEvent::RollRequested(_) => "roll requested",
            BattleEvent::EffectTriggered(_) => "effect triggered",
            BattleEvent::EndTurnConfirmed => "end turn confirmed",
        }
    }
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleEnd {
    /// Someone died from the spell.
    DeathAfterSpell,
    /// Someone died from end-of-turn effects.
    DeathAfterEndTurnEffects,
}

/// What the engine is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// `start` has not been called.
    NotStarted,
    /// Player's StartTurn: waiting for `RollRequested`.
    AwaitingRoll,
    /// Player's TriggerSpell: waiting for `EffectTriggered`.
    AwaitingEffect,
    /// EndTurn: waiting for `EndTurnConfirmed`.
    AwaitingConfirm,
    /// A continuation is pending; advance the clock.
    Suspended { remaining: u64 },
    /// The session is over.
    Ended(BattleEnd),
}

impl EngineStatus {
    /// Whether the host must send an event for the session to progress.
    #[must_use]
    pub fn awaits_event(self) -> bool {
        matches!(
            self,
            EngineStatus::AwaitingRoll | EngineStatus::AwaitingEffect | EngineStatus::AwaitingConfirm
        )
    }
}

/// A rejected event. The engine state is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("battle has not started")]
    NotStarted,

    #[error("battle already started")]
    AlreadyStarted,

    #[error("battle has ended ({0:?})")]
    Ended(BattleEnd),

    #[error("{event} rejected: continuation pending for {remaining} more units")]
    Busy { event: &'static str, remaining: u64 },

    #[error("{event} not accepted during {phase}")]
    WrongPhase { event: &'static str, phase: BattlePhase },

    #[error("{requested} cannot act during the {current} turn")]
    NotYourTurn { requested: TurnOwner, current: TurnOwner },

    #[error("{event} not accepted: {owner} turns run automatically")]
    AutomatedTurn { event: &'static str, owner: TurnOwner },
}

/// Drives one battle session.
///
/// Generic over lifecycle hooks `H`, the spell handler `E` and the die
/// source `D`. Sessions share nothing; dropping the engine abandons any
/// pending continuation.
pub struct TurnEngine<H, E, D> {
    config: BattleConfig,
    decoder: EffectDecoder,
    hooks: H,
    handler: E,
    dice: D,
    state: BattleState,
    clock: VirtualClock,
    history: Vector<BattleState>,
    outcomes: Vector<DecodeOutcome>,
    started: bool,
    ended: Option<BattleEnd>,
}

impl TurnEngine<LoggingHooks, EffectLog, BattleRng> {
    /// Engine with logging hooks, a journaling handler and a die seeded
    /// from `config.seed`.
    pub fn from_config(config: BattleConfig) -> Self {
        let dice = BattleRng::new(config.seed).for_context("turn-dice");
        Self::new(config, LoggingHooks, EffectLog::new(), dice)
    }
}

impl<H, E, D> TurnEngine<H, E, D>
where
    H: BattleHooks,
    E: EffectHandler,
    D: DieRoller,
{
    /// Create an engine. Call [`start`](Self::start) to begin.
    pub fn new(config: BattleConfig, hooks: H, handler: E, dice: D) -> Self {
        let decoder = EffectDecoder::from_config(&config);
        let state = BattleState {
            turn_owner: config.first_owner,
            ..BattleState::default()
        };
        Self {
            config,
            decoder,
            hooks,
            handler,
            dice,
            state,
            clock: VirtualClock::new(),
            history: Vector::new(),
            outcomes: Vector::new(),
            started: false,
            ended: None,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Every committed state, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<BattleState> {
        &self.history
    }

    /// Every decode result, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> &Vector<DecodeOutcome> {
        &self.outcomes
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    #[must_use]
    pub fn handler(&self) -> &E {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut E {
        &mut self.handler
    }

    #[must_use]
    pub fn dice(&self) -> &D {
        &self.dice
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Scheduled> {
        self.clock.pending()
    }

    /// How the session ended, if it has.
    #[must_use]
    pub fn end(&self) -> Option<BattleEnd> {
        self.ended
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    /// What the engine is waiting for.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        if !self.started {
            return EngineStatus::NotStarted;
        }
        if let Some(end) = self.ended {
            return EngineStatus::Ended(end);
        }
        if let Some(remaining) = self.clock.remaining() {
            return EngineStatus::Suspended { remaining };
        }
        match self.state.phase {
            BattlePhase::StartTurn => EngineStatus::AwaitingRoll,
            BattlePhase::TriggerSpell => EngineStatus::AwaitingEffect,
            BattlePhase::EndTurn => EngineStatus::AwaitingConfirm,
            BattlePhase::Animating => EngineStatus::Suspended { remaining: 0 },
        }
    }

    // === Host API ===

    /// Run start-of-battle effects and open the first turn.
    pub fn start(&mut self, setup: BattleSetup) -> Result<EngineStatus, EngineError> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        self.started = true;
        info!(first_owner = %self.config.first_owner, biome = %setup.biome, "battle started");
        self.hooks.start_battle(&setup);
        self.enter_start_turn(self.config.first_owner);
        Ok(self.status())
    }

    /// Apply a host event.
    pub fn handle(&mut self, event: BattleEvent) -> Result<EngineStatus, EngineError> {
        if let Err(error) = self.accepts(&event) {
            warn!(event = event.name(), %error, "event rejected");
            return Err(error);
        }
        debug!(event = event.name(), "event accepted");

        match event {
            BattleEvent::RollRequested(owner) => self.start_dice_roll(owner),
            BattleEvent::EffectTriggered(code) => self.resolve_effect(code),
            BattleEvent::EndTurnConfirmed => self.enter_start_turn(self.state.turn_owner.opposite()),
        }
        Ok(self.status())
    }

    /// Move the clock forward, firing every continuation that falls due.
    pub fn advance(&mut self, elapsed: u64) -> EngineStatus {
        let deadline = self.clock.now().saturating_add(elapsed);
        while let Some(continuation) = self.clock.pop_due(deadline) {
            self.fire(continuation);
        }
        self.clock.set_now(deadline);
        self.status()
    }

    /// Fire the pending continuation now, whatever its due time.
    pub fn fast_forward(&mut self) -> EngineStatus {
        if let Some(continuation) = self.clock.pop_now() {
            self.fire(continuation);
        }
        self.status()
    }

    /// Fire continuations until the engine needs an event or has ended.
    pub fn run_until_idle(&mut self) -> EngineStatus {
        while !self.clock.is_idle() {
            self.fast_forward();
        }
        self.status()
    }

    // === Transitions ===

    fn accepts(&self, event: &BattleEvent) -> Result<(), EngineError> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        if let Some(end) = self.ended {
            return Err(EngineError::Ended(end));
        }

        let expected = match event {
            BattleEvent::RollRequested(_) => BattlePhase::StartTurn,
            BattleEvent::EffectTriggered(_) => BattlePhase::TriggerSpell,
            BattleEvent::EndTurnConfirmed => BattlePhase::EndTurn,
        };
        if self.state.phase != expected {
            return Err(EngineError::WrongPhase {
                event: event.name(),
                phase: self.state.phase,
            });
        }

        let current = self.state.turn_owner;
        if let BattleEvent::RollRequested(requested) = event {
            if *requested != current {
                return Err(EngineError::NotYourTurn {
                    requested: *requested,
                    current,
                });
            }
        }
        let needs_input = matches!(event, BattleEvent::RollRequested(_) | BattleEvent::EffectTriggered(_));
        if needs_input && current.is_automated() {
            return Err(EngineError::AutomatedTurn {
                event: event.name(),
                owner: current,
            });
        }

        if let Some(remaining) = self.clock.remaining() {
            return Err(EngineError::Busy {
                event: event.name(),
                remaining,
            });
        }
        Ok(())
    }

    fn fire(&mut self, continuation: Continuation) {
        debug!(?continuation, now = self.clock.now(), "continuation due");
        match continuation {
            Continuation::FinishRoll => self.finish_roll(),
            Continuation::AutoTrigger(code) => self.resolve_effect(code),
            Continuation::FinishAnimation => self.finish_animation(),
        }
    }

    /// Record the current state and notify hooks.
    fn commit(&mut self) {
        debug!(
            phase = %self.state.phase,
            owner = %self.state.turn_owner,
            roll = ?self.state.roll,
            turn = self.state.turn_number,
            "battle transition"
        );
        self.hooks.on_transition(&self.state);
        self.history.push_back(self.state.clone());
    }

    fn enter_start_turn(&mut self, owner: TurnOwner) {
        self.state = BattleState {
            phase: BattlePhase::StartTurn,
            turn_owner: owner,
            roll: None,
            effect_code: None,
            animating_effect_code: None,
            is_rolling: false,
            turn_number: self.state.turn_number + 1,
        };
        info!(%owner, turn = self.state.turn_number, "turn started");
        self.commit();
        self.hooks.start_turn(owner);

        if owner.is_automated() {
            self.start_dice_roll(owner);
        }
    }

    fn start_dice_roll(&mut self, owner: TurnOwner) {
        self.state.is_rolling = true;
        self.state.roll = None;
        self.commit();
        debug!(%owner, delay = self.config.roll_delay, "rolling");
        self.clock.schedule(self.config.roll_delay, Continuation::FinishRoll);
    }

    fn finish_roll(&mut self) {
        let owner = self.state.turn_owner;
        let roll = clamp_face(self.dice.roll_die());
        self.state.roll = Some(roll);
        self.state.is_rolling = false;
        info!(%owner, roll, "die rolled");
        self.hooks.roll_effects(owner, roll);

        let code = EffectCode::dice(roll);
        self.state.effect_code = Some(code.clone());
        self.state.phase = BattlePhase::TriggerSpell;
        self.commit();

        if owner.is_automated() {
            self.clock
                .schedule(self.config.auto_trigger_delay, Continuation::AutoTrigger(code));
        }
    }

    fn resolve_effect(&mut self, code: EffectCode) {
        let owner = self.state.turn_owner;
        let context = CallerContext::new(owner, self.state.roll);
        info!(%owner, code = %code, roll = ?self.state.roll, "calculating spell effects");

        let outcome = self
            .decoder
            .decode(code.as_str(), context, &mut self.dice, &mut self.handler);
        debug!(?outcome, "effect decoded");
        self.outcomes.push_back(outcome);

        self.state.effect_code = Some(code.clone());
        self.state.animating_effect_code = Some(code);
        self.state.phase = BattlePhase::Animating;
        self.commit();
        self.clock
            .schedule(self.config.animation_delay, Continuation::FinishAnimation);
    }

    fn finish_animation(&mut self) {
        let owner = self.state.turn_owner;

        if self.hooks.death_check() {
            self.finish(BattleEnd::DeathAfterSpell);
            return;
        }

        self.hooks.end_turn_effects(owner);

        if self.hooks.death_check() {
            self.finish(BattleEnd::DeathAfterEndTurnEffects);
            return;
        }

        self.state.phase = BattlePhase::EndTurn;
        self.commit();
    }

    fn finish(&mut self, end: BattleEnd) {
        info!(?end, turn = self.state.turn_number, owner = %self.state.turn_owner, "battle ended");
        self.ended = Some(end);
    }
}
