//! Battle state snapshots.
//!
//! `BattleState` is small and cloned after every transition, so hosts can
//! render or persist any point of a session.

use serde::{Deserialize, Serialize};

use crate::core::TurnOwner;
use crate::effects::EffectCode;

/// Phase of the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BattlePhase {
    /// Waiting for the die roll (or rolling).
    #[default]
    StartTurn,
    /// Rolled; waiting for a spell to be triggered.
    TriggerSpell,
    /// Spell resolved; animation running.
    Animating,
    /// Waiting for the end of turn to be confirmed.
    EndTurn,
}

impl BattlePhase {
    /// The phase that normally follows this one.
    #[must_use]
    pub fn next(self) -> BattlePhase {
        match self {
            BattlePhase::StartTurn => BattlePhase::TriggerSpell,
            BattlePhase::TriggerSpell => BattlePhase::Animating,
            BattlePhase::Animating => BattlePhase::EndTurn,
            BattlePhase::EndTurn => BattlePhase::StartTurn,
        }
    }
}

impl std::fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BattlePhase::StartTurn => "startTurn",
            BattlePhase::TriggerSpell => "triggerSpell",
            BattlePhase::Animating => "animating",
            BattlePhase::EndTurn => "endTurn",
        };
        f.write_str(name)
    }
}

/// Observable state of a battle session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub turn_owner: TurnOwner,
    /// This turn's die, `1..=6` once rolled.
    pub roll: Option<u8>,
    /// Code offered or triggered this turn.
    pub effect_code: Option<EffectCode>,
    /// Code being animated.
    pub animating_effect_code: Option<EffectCode>,
    pub is_rolling: bool,
    /// Turn counter, starting at 1.
    pub turn_number: u32,
}

impl BattleState {
    /// The code a host should show while animating.
    #[must_use]
    pub fn displayed_effect_code(&self) -> Option<&EffectCode> {
        self.animating_effect_code.as_ref().or(self.effect_code.as_ref())
    }

    /// Label for the upcoming turn, e.g. "Enemies Turn".
    #[must_use]
    pub fn next_turn_label(&self) -> &'static str {
        self.turn_owner.opposite().turn_label()
    }
}
