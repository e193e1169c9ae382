//! Effect dispatch: base code → handler, with per-family parameters.
//!
//! The dispatcher matches a parsed effect's base against the closed
//! [`BaseCode`] set, resolves the tokens its family consumes, and hands a
//! [`SpellInvocation`] to an [`EffectHandler`]. Unknown bases are an
//! expected outcome (placeholder or malformed codes) and invoke nothing.
//!
//! Handlers own the combat math. The stock [`EffectLog`] only records
//! what was invoked.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::TurnOwner;

use super::base::{BaseCode, EffectFamily};
use super::parser::ParsedEffect;
use super::value::{resolve_raw, ResolveError, ResolvedValue, Scaling};

/// Caller context merged into every invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Side casting the effect.
    pub turn_owner: TurnOwner,
    /// The turn's die roll, if one has happened.
    pub roll: Option<u8>,
}

impl CallerContext {
    pub fn new(turn_owner: TurnOwner, roll: Option<u8>) -> Self {
        Self { turn_owner, roll }
    }
}

/// Family-specific handler parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectParams {
    Amount {
        amount: Option<ResolvedValue>,
    },
    Duration {
        duration: Option<ResolvedValue>,
    },
    Confuse {
        marked_slots: Option<ResolvedValue>,
        damage_amount: Option<ResolvedValue>,
    },
    Buff {
        buff_amount: Option<ResolvedValue>,
        duration: Option<ResolvedValue>,
        target_tier: Option<ResolvedValue>,
        buff_class: Option<String>,
    },
    Charge {
        charge_amount: Option<ResolvedValue>,
        target_tier: Option<ResolvedValue>,
        charge_class: Option<String>,
    },
    DiceTrigger,
}

/// Parameters handed to a handler. Scaling is always included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParams {
    pub scaling: Scaling,
    pub params: EffectParams,
}

/// One handler call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellInvocation {
    pub base: BaseCode,
    pub params: ResolvedParams,
    pub context: CallerContext,
}

/// Receives dispatched spells.
///
/// One implementation serves every base code; `invocation.base` selects
/// the behavior.
pub trait EffectHandler {
    fn invoke(&mut self, invocation: &SpellInvocation);
}

impl<H: EffectHandler + ?Sized> EffectHandler for &mut H {
    fn invoke(&mut self, invocation: &SpellInvocation) {
        (**self).invoke(invocation);
    }
}

impl<H: EffectHandler + ?Sized> EffectHandler for Box<H> {
    fn invoke(&mut self, invocation: &SpellInvocation) {
        (**self).invoke(invocation);
    }
}

/// Handler that journals invocations without touching combat state.
///
/// Uses an `im::Vector` so the journal clones in O(1) alongside engine
/// snapshots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectLog {
    invocations: Vector<SpellInvocation>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation, oldest first.
    #[must_use]
    pub fn invocations(&self) -> &Vector<SpellInvocation> {
        &self.invocations
    }

    /// Most recent invocation.
    #[must_use]
    pub fn last(&self) -> Option<&SpellInvocation> {
        self.invocations.last()
    }

    /// Number of invocations of one base code.
    #[must_use]
    pub fn count_for(&self, base: BaseCode) -> usize {
        self.invocations.iter().filter(|inv| inv.base == base).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn clear(&mut self) {
        self.invocations.clear();
    }
}

impl EffectHandler for EffectLog {
    fn invoke(&mut self, invocation: &SpellInvocation) {
        info!(
            base = %invocation.base,
            spell = %invocation.base.label(),
            owner = %invocation.context.turn_owner,
            roll = ?invocation.context.roll,
            params = ?invocation.params.params,
            "spell invoked"
        );
        self.invocations.push_back(invocation.clone());
    }
}

/// Result of decoding one effect code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeOutcome {
    /// The handler ran.
    Dispatched {
        base: BaseCode,
        params: ResolvedParams,
        /// Roll-again die, when the code was gated and passed.
        roll_again: Option<u8>,
    },
    /// Roll-again drew an odd face; nothing ran.
    Fizzled { roll_again: u8 },
    /// The base has no handler; nothing ran.
    NoHandler { base: String },
    /// Strict mode refused a token that failed to resolve; nothing ran.
    Rejected { base: BaseCode, error: ResolveError },
}

impl DecodeOutcome {
    /// Whether a handler was invoked.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Dispatched { .. })
    }

    /// The roll-again die, when one was drawn.
    #[must_use]
    pub fn roll_again_result(&self) -> Option<u8> {
        match self {
            DecodeOutcome::Dispatched { roll_again, .. } => *roll_again,
            DecodeOutcome::Fizzled { roll_again } => Some(*roll_again),
            DecodeOutcome::NoHandler { .. } | DecodeOutcome::Rejected { .. } => None,
        }
    }
}

/// Routes parsed effects to a handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectDispatcher {
    strict: bool,
}

impl EffectDispatcher {
    /// Dispatcher that drops unresolvable tokens and dispatches anyway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher that rejects effects with unresolvable tokens.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Assemble handler parameters for a recognized base.
    pub fn assemble(&self, base: BaseCode, parsed: &ParsedEffect) -> Result<ResolvedParams, ResolveError> {
        let scaling = parsed.scaling();
        let strict = self.strict;

        let resolve = |raw: Option<&str>| -> Result<Option<ResolvedValue>, ResolveError> {
            let Some(raw) = raw else {
                return Ok(None);
            };
            match resolve_raw(raw, scaling) {
                Ok(value) => Ok(Some(value)),
                Err(error) if strict => Err(error),
                Err(error) => {
                    warn!(%base, raw, %error, "dispatching with unresolved parameter");
                    Ok(None)
                }
            }
        };

        let params = match base.family() {
            EffectFamily::Amount => EffectParams::Amount {
                amount: resolve(parsed.first_value())?,
            },
            EffectFamily::Duration => EffectParams::Duration {
                duration: resolve(parsed.first_value())?,
            },
            EffectFamily::Confuse => {
                let marked_slots = match resolve(parsed.first_value())? {
                    Some(slots) => Some(slots),
                    None => resolve(parsed.token('M'))?,
                };
                EffectParams::Confuse {
                    marked_slots,
                    damage_amount: resolve(parsed.token('D'))?,
                }
            }
            EffectFamily::Buff => EffectParams::Buff {
                buff_amount: resolve(parsed.first_value())?,
                duration: resolve(parsed.token('D'))?,
                target_tier: resolve(parsed.token('T'))?,
                buff_class: parsed.token('C').map(str::to_string),
            },
            EffectFamily::Charge => EffectParams::Charge {
                charge_amount: resolve(parsed.first_value())?,
                target_tier: resolve(parsed.token('T'))?,
                charge_class: parsed.token('C').map(str::to_string),
            },
            EffectFamily::DiceTrigger => EffectParams::DiceTrigger,
        };

        Ok(ResolvedParams { scaling, params })
    }

    /// Dispatch a parsed effect. The roll-again gate, if any, has already
    /// passed with `roll_again`.
    pub fn dispatch<H: EffectHandler + ?Sized>(
        &self,
        parsed: &ParsedEffect,
        context: CallerContext,
        roll_again: Option<u8>,
        handler: &mut H,
    ) -> DecodeOutcome {
        let Some(base) = parsed.base_code() else {
            debug!(base = parsed.base(), "no spell handler found");
            return DecodeOutcome::NoHandler {
                base: parsed.base().to_string(),
            };
        };

        let params = match self.assemble(base, parsed) {
            Ok(params) => params,
            Err(error) => {
                warn!(%base, %error, "effect rejected");
                return DecodeOutcome::Rejected { base, error };
            }
        };

        handler.invoke(&SpellInvocation {
            base,
            params: params.clone(),
            context,
        });

        DecodeOutcome::Dispatched {
            base,
            params,
            roll_again,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{StatFocus, TargetGroup};

    fn player_ctx() -> CallerContext {
        CallerContext::new(TurnOwner::Player, Some(3))
    }

    fn dispatch(code: &str) -> (DecodeOutcome, EffectLog) {
        let mut log = EffectLog::new();
        let outcome = EffectDispatcher::new().dispatch(&ParsedEffect::parse(code), player_ctx(), None, &mut log);
        (outcome, log)
    }

    #[test]
    fn test_amount_family() {
        let (outcome, log) = dispatch("ATT{R4}-111");
        assert!(outcome.is_success());
        assert_eq!(log.len(), 1);

        let invocation = log.last().unwrap();
        assert_eq!(invocation.base, BaseCode::Attack);
        assert_eq!(invocation.context, player_ctx());
        assert_eq!(invocation.params.scaling, Scaling::new(1, 1, 1));
        assert_eq!(
            invocation.params.params,
            EffectParams::Amount { amount: Some(ResolvedValue::Integer(7)) }
        );
    }

    #[test]
    fn test_duration_family() {
        let (_, log) = dispatch("FRZ{2}");
        assert_eq!(
            log.last().unwrap().params.params,
            EffectParams::Duration { duration: Some(ResolvedValue::Integer(2)) }
        );
    }

    #[test]
    fn test_confuse_falls_back_to_m_token() {
        let (_, log) = dispatch("CON{max(2)}M{4}D{R1}");
        assert_eq!(
            log.last().unwrap().params.params,
            EffectParams::Confuse {
                marked_slots: Some(ResolvedValue::Sequence([1, 2].into_iter().collect())),
                damage_amount: Some(ResolvedValue::Integer(1)),
            }
        );

        // An unresolvable first value falls back to M
        let (_, log) = dispatch("CON{R11}M{max(3)}D{5}");
        match &log.last().unwrap().params.params {
            EffectParams::Confuse { marked_slots, damage_amount } => {
                assert_eq!(marked_slots.as_ref().and_then(|v| v.as_sequence()), Some(&[1, 2, 3][..]));
                assert_eq!(damage_amount, &Some(ResolvedValue::Integer(5)));
            }
            other => panic!("Expected Confuse, got {:?}", other),
        }
    }

    #[test]
    fn test_buff_family() {
        let (_, log) = dispatch("BFR{R2}D{2}T{1}C{mage}-311");
        let invocation = log.last().unwrap();
        assert_eq!(invocation.base, BaseCode::Buff(StatFocus::Both, TargetGroup::Right));
        assert_eq!(
            invocation.params.params,
            EffectParams::Buff {
                // 3 + 21 * 0.75 = 18.75
                buff_amount: Some(ResolvedValue::Integer(19)),
                duration: Some(ResolvedValue::Integer(2)),
                target_tier: Some(ResolvedValue::Integer(1)),
                buff_class: Some("mage".to_string()),
            }
        );
    }

    #[test]
    fn test_buff_class_is_raw_text() {
        let (_, log) = dispatch("BAL{1}C{12}");
        match &log.last().unwrap().params.params {
            EffectParams::Buff { buff_class, duration, .. } => {
                assert_eq!(buff_class.as_deref(), Some("12"));
                assert_eq!(duration, &None);
            }
            other => panic!("Expected Buff, got {:?}", other),
        }
    }

    #[test]
    fn test_charge_family() {
        let (_, log) = dispatch("CHA{R1}T{2}");
        assert_eq!(
            log.last().unwrap().params.params,
            EffectParams::Charge {
                charge_amount: Some(ResolvedValue::Integer(1)),
                target_tier: Some(ResolvedValue::Integer(2)),
                charge_class: None,
            }
        );
    }

    #[test]
    fn test_dice_trigger_has_context_only() {
        let (outcome, log) = dispatch("ID5");
        assert!(outcome.is_success());
        let invocation = log.last().unwrap();
        assert_eq!(invocation.params.params, EffectParams::DiceTrigger);
        assert_eq!(invocation.params.scaling, Scaling::default());
        assert_eq!(invocation.context.roll, Some(3));
    }

    #[test]
    fn test_unknown_base_invokes_nothing() {
        let (outcome, log) = dispatch("XYZ{1}");
        assert_eq!(outcome, DecodeOutcome::NoHandler { base: "XYZ".to_string() });
        assert!(!outcome.is_success());
        assert!(log.is_empty());

        let (outcome, _) = dispatch("");
        assert_eq!(outcome, DecodeOutcome::NoHandler { base: String::new() });
    }

    #[test]
    fn test_invalid_ranged_dispatches_without_value() {
        let (outcome, log) = dispatch("HEA{R11}-222");
        assert!(outcome.is_success());
        assert_eq!(
            log.last().unwrap().params.params,
            EffectParams::Amount { amount: None }
        );
    }

    #[test]
    fn test_strict_rejects_invalid_ranged() {
        let mut log = EffectLog::new();
        let outcome = EffectDispatcher::strict().dispatch(
            &ParsedEffect::parse("HEA{R11}-222"),
            player_ctx(),
            None,
            &mut log,
        );
        assert_eq!(
            outcome,
            DecodeOutcome::Rejected {
                base: BaseCode::Heal,
                error: ResolveError::UnknownRangedValue(11),
            }
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_strict_ignores_tokens_family_does_not_use() {
        let mut log = EffectLog::new();
        let outcome = EffectDispatcher::strict().dispatch(
            &ParsedEffect::parse("ATT{3}D{R99}"),
            player_ctx(),
            None,
            &mut log,
        );
        assert!(outcome.is_success());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_every_catalog_code_has_a_handler() {
        let mut log = EffectLog::new();
        for base in BaseCode::all() {
            let parsed = ParsedEffect::parse(&base.to_string());
            let outcome = EffectDispatcher::new().dispatch(&parsed, player_ctx(), None, &mut log);
            assert!(outcome.is_success(), "{}", base);
        }
        assert_eq!(log.len(), 44);
        assert_eq!(log.count_for(BaseCode::Guard), 1);
    }

    #[test]
    fn test_outcome_roll_again_result() {
        assert_eq!(DecodeOutcome::Fizzled { roll_again: 3 }.roll_again_result(), Some(3));
        assert_eq!(
            DecodeOutcome::NoHandler { base: "Q".into() }.roll_again_result(),
            None
        );
    }

    #[test]
    fn test_invocation_serializes() {
        let (_, log) = dispatch("BGA{R5}D{1}-222");
        let json = serde_json::to_string(log.last().unwrap()).unwrap();
        assert!(json.contains("\"BGA\""));
        let back: SpellInvocation = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, log.last().unwrap());
    }
}
