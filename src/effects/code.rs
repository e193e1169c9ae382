//! Effect codes and their assembly.
//!
//! `EffectCode` is the wire-format string. Hosts that collect spell inputs
//! (base, parameter values, scaling, roll-again) assemble one with
//! `EffectCodeBuilder`, which renders parameters in the base code's schema
//! order.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::base::BaseCode;
use super::parser::{ParsedEffect, ROLL_AGAIN_PREFIX};

/// An effect code string, e.g. `RAGUA{R3}T{2}D{1}-323`.
///
/// Any text is accepted; malformed codes decode to "no handler".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectCode(String);

impl EffectCode {
    /// Wrap a code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The dice-trigger code for a rolled face, e.g. `ID3`.
    #[must_use]
    pub fn dice(roll: u8) -> Self {
        Self(format!("ID{}", roll))
    }

    /// Start assembling a code for a base.
    pub fn builder(base: BaseCode) -> EffectCodeBuilder {
        EffectCodeBuilder::new(base)
    }

    /// The raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into structured form.
    #[must_use]
    pub fn parse(&self) -> ParsedEffect {
        ParsedEffect::parse(&self.0)
    }
}

impl std::fmt::Display for EffectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EffectCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for EffectCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Why an effect code could not be assembled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A value was supplied for a key the base does not take.
    #[error("{base} has no parameter {key:?}")]
    UnknownParameter { base: BaseCode, key: String },

    /// A schema parameter is missing or blank.
    #[error("{base} requires parameter {key:?}")]
    MissingParameter { base: BaseCode, key: &'static str },

    /// A value contains `}` and would break the grammar.
    #[error("value for {key:?} cannot contain '}}'")]
    InvalidValue { key: &'static str },

    /// Tier, level and progression rate were not supplied.
    #[error("tier, level and progression rate are required")]
    MissingScaling,

    /// A scaling value does not fit in one digit.
    #[error("{field} must be a single digit, got {value}")]
    ScalingOutOfRange { field: &'static str, value: u8 },
}

/// Assembles an [`EffectCode`] from per-parameter inputs.
///
/// ```
/// use spell_battle::effects::{BaseCode, EffectCode, StatFocus, TargetGroup};
///
/// let code = EffectCode::builder(BaseCode::Buff(StatFocus::Attack, TargetGroup::Left))
///     .with_value("buff_amount", "R2")
///     .with_value("duration", "2")
///     .with_value("target_tier", "1")
///     .with_value("buff_class", "mage")
///     .with_scaling(2, 4, 1)
///     .build()
///     .unwrap();
///
/// assert_eq!(code.as_str(), "BAL{R2}D{2}T{1}C{mage}-241");
/// ```
#[derive(Clone, Debug)]
pub struct EffectCodeBuilder {
    base: BaseCode,
    values: FxHashMap<String, String>,
    scaling: Option<(u8, u8, u8)>,
    roll_again: bool,
}

impl EffectCodeBuilder {
    /// Create a builder for a base.
    pub fn new(base: BaseCode) -> Self {
        Self {
            base,
            values: FxHashMap::default(),
            scaling: None,
            roll_again: false,
        }
    }

    /// Set a parameter value by schema key.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set tier, level and progression rate.
    #[must_use]
    pub fn with_scaling(mut self, tier: u8, level: u8, progression_rate: u8) -> Self {
        self.scaling = Some((tier, level, progression_rate));
        self
    }

    /// Gate the effect behind a roll-again check.
    #[must_use]
    pub fn roll_again(mut self, enabled: bool) -> Self {
        self.roll_again = enabled;
        self
    }

    /// Whether every input needed by [`build`](Self::build) is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.clone().build().is_ok()
    }

    /// Render the code.
    pub fn build(self) -> Result<EffectCode, BuildError> {
        let params = self.base.parameters();

        if let Some(key) = self.values.keys().find(|key| !params.iter().any(|p| p.key == key.as_str())) {
            return Err(BuildError::UnknownParameter {
                base: self.base,
                key: key.clone(),
            });
        }

        let (tier, level, progression_rate) = self.scaling.ok_or(BuildError::MissingScaling)?;
        for (field, value) in [
            ("tier", tier),
            ("level", level),
            ("progression_rate", progression_rate),
        ] {
            if value > 9 {
                return Err(BuildError::ScalingOutOfRange { field, value });
            }
        }

        let mut code = String::new();
        if self.roll_again {
            code.push_str(ROLL_AGAIN_PREFIX);
        }
        code.push_str(&self.base.to_string());

        for param in params {
            let value = self
                .values
                .get(param.key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .ok_or(BuildError::MissingParameter {
                    base: self.base,
                    key: param.key,
                })?;
            if value.contains('}') {
                return Err(BuildError::InvalidValue { key: param.key });
            }
            if let Some(letter) = param.token {
                code.push(letter);
            }
            code.push('{');
            code.push_str(value);
            code.push('}');
        }

        code.push_str(&format!("-{}{}{}", tier, level, progression_rate));
        Ok(EffectCode(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{StatFocus, TargetGroup};

    #[test]
    fn test_dice_code() {
        assert_eq!(EffectCode::dice(4).as_str(), "ID4");
        assert_eq!(EffectCode::dice(4).parse().base_code(), Some(BaseCode::DiceTrigger(4)));
    }

    #[test]
    fn test_build_amount() {
        let code = EffectCode::builder(BaseCode::Attack)
            .with_value("amount", "R4")
            .with_scaling(1, 1, 1)
            .build()
            .unwrap();
        assert_eq!(code.as_str(), "ATT{R4}-111");
    }

    #[test]
    fn test_build_roll_again_confuse() {
        let code = EffectCode::builder(BaseCode::Confuse)
            .with_value("marked_slots", "max(2)")
            .with_value("damage_amount", " R1 ")
            .with_scaling(2, 2, 2)
            .roll_again(true)
            .build()
            .unwrap();
        assert_eq!(code.as_str(), "RACON{max(2)}D{R1}-222");

        let parsed = code.parse();
        assert!(parsed.roll_again());
        assert_eq!(parsed.first_value(), Some("max(2)"));
        assert_eq!(parsed.token('D'), Some("R1"));
    }

    #[test]
    fn test_build_round_trips_through_parser() {
        let base = BaseCode::Charge(StatFocus::Both, TargetGroup::Greater);
        let code = EffectCode::builder(base)
            .with_value("charge_amount", "R7")
            .with_value("target_tier", "2")
            .with_value("charge_class", "knight")
            .with_scaling(3, 1, 5)
            .build()
            .unwrap();

        let parsed = code.parse();
        assert_eq!(parsed.base_code(), Some(base));
        assert_eq!(parsed.first_value(), Some("R7"));
        assert_eq!(parsed.token('T'), Some("2"));
        assert_eq!(parsed.token('C'), Some("knight"));
        assert_eq!(parsed.tier(), Some(3));
        assert_eq!(parsed.progression_rate(), Some(5));
    }

    #[test]
    fn test_missing_inputs() {
        let builder = EffectCode::builder(BaseCode::Stun).with_value("duration", "   ");
        assert!(!builder.is_complete());
        assert_eq!(
            builder.with_scaling(1, 1, 1).build(),
            Err(BuildError::MissingParameter { base: BaseCode::Stun, key: "duration" })
        );

        let no_scaling = EffectCode::builder(BaseCode::Stun).with_value("duration", "2");
        assert_eq!(no_scaling.build(), Err(BuildError::MissingScaling));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let unknown = EffectCode::builder(BaseCode::Heal)
            .with_value("duration", "2")
            .with_scaling(1, 1, 1)
            .build();
        assert!(matches!(unknown, Err(BuildError::UnknownParameter { .. })));

        let brace = EffectCode::builder(BaseCode::Heal)
            .with_value("amount", "1}2")
            .with_scaling(1, 1, 1)
            .build();
        assert_eq!(brace, Err(BuildError::InvalidValue { key: "amount" }));

        let digit = EffectCode::builder(BaseCode::Heal)
            .with_value("amount", "3")
            .with_scaling(1, 12, 1)
            .build();
        assert_eq!(digit, Err(BuildError::ScalingOutOfRange { field: "level", value: 12 }));
    }

    #[test]
    fn test_dice_trigger_needs_only_scaling() {
        let code = EffectCode::builder(BaseCode::DiceTrigger(2))
            .with_scaling(1, 2, 3)
            .build()
            .unwrap();
        assert_eq!(code.as_str(), "ID2-123");
    }

    #[test]
    fn test_effect_code_serde_transparent() {
        let code = EffectCode::from("HEA{5}");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"HEA{5}\"");
    }
}
