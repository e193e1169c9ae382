//! The decode pipeline: parse → roll-again → dispatch.
//!
//! ## Roll-again
//!
//! A code prefixed with `RA` draws one die before anything else happens.
//! Odd faces cancel the effect, even faces let it through. The gate runs
//! before the handler lookup, so an `RA` code with an unknown base still
//! consumes a die.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{clamp_face, BattleConfig, DieRoller};

use super::dispatch::{CallerContext, DecodeOutcome, EffectDispatcher, EffectHandler};
use super::parser::ParsedEffect;

/// Result of the roll-again gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollAgainVerdict {
    /// Even face: continue with dispatch.
    Proceed(u8),
    /// Odd face: the effect fizzles.
    Cancel(u8),
}

impl RollAgainVerdict {
    /// The face that was drawn.
    #[must_use]
    pub fn face(self) -> u8 {
        match self {
            RollAgainVerdict::Proceed(face) | RollAgainVerdict::Cancel(face) => face,
        }
    }

    #[must_use]
    pub fn proceeds(self) -> bool {
        matches!(self, RollAgainVerdict::Proceed(_))
    }
}

/// The roll-again mechanic.
pub struct RollAgain;

impl RollAgain {
    /// Draw one die and decide whether the effect goes ahead.
    pub fn check<D: DieRoller + ?Sized>(dice: &mut D) -> RollAgainVerdict {
        let face = clamp_face(dice.roll_die());
        debug!(face, "roll again result");
        if face % 2 == 1 {
            RollAgainVerdict::Cancel(face)
        } else {
            RollAgainVerdict::Proceed(face)
        }
    }
}

/// Runs effect codes end to end against a handler.
///
/// ```
/// use spell_battle::core::{ScriptedDice, TurnOwner};
/// use spell_battle::effects::{CallerContext, EffectDecoder, EffectLog};
///
/// let mut dice = ScriptedDice::new([4]);
/// let mut log = EffectLog::new();
/// let context = CallerContext::new(TurnOwner::Player, Some(2));
///
/// let outcome = EffectDecoder::new().decode("RAHEA{R1}-111", context, &mut dice, &mut log);
/// assert!(outcome.is_success());
/// assert_eq!(outcome.roll_again_result(), Some(4));
/// assert_eq!(log.len(), 1);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectDecoder {
    dispatcher: EffectDispatcher,
}

impl EffectDecoder {
    /// Permissive decoder: unresolvable tokens are dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that rejects effects with unresolvable tokens.
    pub fn strict() -> Self {
        Self {
            dispatcher: EffectDispatcher::strict(),
        }
    }

    /// Decoder matching a session's configuration.
    pub fn from_config(config: &BattleConfig) -> Self {
        if config.strict_ranged_values {
            Self::strict()
        } else {
            Self::new()
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &EffectDispatcher {
        &self.dispatcher
    }

    /// Decode one effect code.
    ///
    /// The roll-again die is drawn from `dice` only when the code carries
    /// the prefix.
    pub fn decode<D, H>(
        &self,
        code: &str,
        context: CallerContext,
        dice: &mut D,
        handler: &mut H,
    ) -> DecodeOutcome
    where
        D: DieRoller + ?Sized,
        H: EffectHandler + ?Sized,
    {
        let parsed = ParsedEffect::parse(code);
        debug!(code, base = parsed.base(), roll_again = parsed.roll_again(), "decoding effect");

        let roll_again = if parsed.roll_again() {
            match RollAgain::check(dice) {
                RollAgainVerdict::Cancel(face) => {
                    info!(code, face, "roll again failed, effect cancelled");
                    return DecodeOutcome::Fizzled { roll_again: face };
                }
                RollAgainVerdict::Proceed(face) => Some(face),
            }
        } else {
            None
        };

        self.dispatcher.dispatch(&parsed, context, roll_again, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ScriptedDice, TurnOwner};
    use crate::effects::{BaseCode, EffectLog, EffectParams, ResolveError, ResolvedValue};

    fn ctx() -> CallerContext {
        CallerContext::new(TurnOwner::Enemy, Some(5))
    }

    #[test]
    fn test_roll_again_parity() {
        for face in 1..=6u8 {
            let verdict = RollAgain::check(&mut ScriptedDice::new([face]));
            assert_eq!(verdict.face(), face);
            assert_eq!(verdict.proceeds(), face % 2 == 0);
        }
    }

    #[test]
    fn test_roll_again_clamps_out_of_range() {
        assert_eq!(RollAgain::check(&mut ScriptedDice::new([0])), RollAgainVerdict::Cancel(1));
        assert_eq!(RollAgain::check(&mut ScriptedDice::new([200])), RollAgainVerdict::Proceed(6));
    }

    #[test]
    fn test_plain_code_draws_no_die() {
        let mut dice = ScriptedDice::new([1]);
        let mut log = EffectLog::new();
        let outcome = EffectDecoder::new().decode("GUA{4}", ctx(), &mut dice, &mut log);

        assert!(outcome.is_success());
        assert_eq!(outcome.roll_again_result(), None);
        assert_eq!(dice.draws(), 0);
    }

    #[test]
    fn test_odd_roll_again_fizzles() {
        let mut dice = ScriptedDice::new([3]);
        let mut log = EffectLog::new();
        let outcome = EffectDecoder::new().decode("RAGUA{R3}T{2}D{1}-323", ctx(), &mut dice, &mut log);

        assert_eq!(outcome, DecodeOutcome::Fizzled { roll_again: 3 });
        assert!(!outcome.is_success());
        assert!(log.is_empty());
    }

    #[test]
    fn test_even_roll_again_dispatches() {
        let mut dice = ScriptedDice::new([6]);
        let mut log = EffectLog::new();
        let outcome = EffectDecoder::new().decode("RAGUA{R3}T{2}D{1}-323", ctx(), &mut dice, &mut log);

        match outcome {
            DecodeOutcome::Dispatched { base, params, roll_again } => {
                assert_eq!(base, BaseCode::Guard);
                assert_eq!(roll_again, Some(6));
                // weight 0.5, t=3, l=2: 5 + 21 * (0.5 + 0.125) = 18.125
                assert_eq!(params.params, EffectParams::Amount { amount: Some(ResolvedValue::Integer(18)) });
            }
            other => panic!("Expected Dispatched, got {:?}", other),
        }
        assert_eq!(log.last().unwrap().context, ctx());
    }

    #[test]
    fn test_roll_again_runs_before_lookup() {
        let mut dice = ScriptedDice::new([2]);
        let mut log = EffectLog::new();
        let outcome = EffectDecoder::new().decode("RAXYZ{1}", ctx(), &mut dice, &mut log);

        assert_eq!(outcome, DecodeOutcome::NoHandler { base: "XYZ".to_string() });
        assert_eq!(dice.draws(), 1);

        let outcome = EffectDecoder::new().decode("RAXYZ{1}", ctx(), &mut ScriptedDice::new([5]), &mut log);
        assert_eq!(outcome, DecodeOutcome::Fizzled { roll_again: 5 });
    }

    #[test]
    fn test_from_config() {
        let permissive = EffectDecoder::from_config(&BattleConfig::default());
        assert!(!permissive.dispatcher().is_strict());

        let strict = EffectDecoder::from_config(&BattleConfig::default().strict());
        let mut log = EffectLog::new();
        let outcome = strict.decode("STU{R0}", ctx(), &mut ScriptedDice::default(), &mut log);
        assert_eq!(
            outcome,
            DecodeOutcome::Rejected {
                base: BaseCode::Stun,
                error: ResolveError::UnknownRangedValue(0),
            }
        );
    }
}
