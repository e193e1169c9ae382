//! Token value resolution.
//!
//! Raw token text from an effect code resolves by pattern:
//!
//! | Raw         | Result                                        |
//! |-------------|-----------------------------------------------|
//! | `R1`..`R10` | Scaled integer from [`RANGED_VALUE_TABLE`]    |
//! | `max(N)`    | Index sequence `1..=N`                        |
//! | `42`        | Integer, parsed directly                      |
//! | anything    | Literal text (class names, identifiers)       |
//!
//! Ranged values blend a tier-driven and a level-driven contribution.
//! The progression rate shifts weight from tier toward level.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::warn;

/// Largest `N` accepted in a `max(N)` token.
pub const MAX_INDEX_RANGE: u32 = 1024;

/// Scaling metadata carried in an effect code's `-TLP` suffix.
///
/// Missing fields fall back to 1 when a ranged value is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scaling {
    pub tier: Option<u8>,
    pub level: Option<u8>,
    pub progression_rate: Option<u8>,
}

impl Scaling {
    /// Scaling with all three values set.
    #[must_use]
    pub const fn new(tier: u8, level: u8, progression_rate: u8) -> Self {
        Self {
            tier: Some(tier),
            level: Some(level),
            progression_rate: Some(progression_rate),
        }
    }

    /// Whether any value was supplied.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.tier.is_some() || self.level.is_some() || self.progression_rate.is_some()
    }
}

/// One row of the ranged value table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangedValueEntry {
    pub r_number: u8,
    pub min: i64,
    pub max: i64,
}

const fn entry(r_number: u8, min: i64, max: i64) -> RangedValueEntry {
    RangedValueEntry { r_number, min, max }
}

/// Bounds for `R1`..`R10`.
pub const RANGED_VALUE_TABLE: [RangedValueEntry; 10] = [
    entry(1, 1, 18),
    entry(2, 3, 24),
    entry(3, 5, 26),
    entry(4, 7, 32),
    entry(5, 10, 34),
    entry(6, 12, 40),
    entry(7, 15, 42),
    entry(8, 17, 48),
    entry(9, 20, 50),
    entry(10, 22, 56),
];

/// Lookup and scaling over [`RANGED_VALUE_TABLE`].
pub struct RangedValueTable;

impl RangedValueTable {
    /// Get the bounds for a ranged number. `None` outside `1..=10`.
    #[must_use]
    pub fn get(r_number: u32) -> Option<&'static RangedValueEntry> {
        let index = usize::try_from(r_number).ok()?.checked_sub(1)?;
        RANGED_VALUE_TABLE.get(index)
    }

    /// Compute the scaled value for a ranged number.
    #[must_use]
    pub fn scaled(r_number: u32, scaling: Scaling) -> Option<i64> {
        Self::get(r_number).map(|entry| entry.scaled(scaling))
    }
}

impl RangedValueEntry {
    /// Blend of tier and level contributions between `min` and `max`.
    ///
    /// ```text
    /// weight = 0.25 + (pr - 1) / 8
    /// value  = min + (max - min) * ((1 - weight) * (t - 1) / 2 + weight * (l - 1) / 4)
    /// ```
    ///
    /// Rounds half toward positive infinity.
    #[must_use]
    pub fn scaled(&self, scaling: Scaling) -> i64 {
        let pr = f64::from(scaling.progression_rate.unwrap_or(1));
        let t = f64::from(scaling.tier.unwrap_or(1));
        let l = f64::from(scaling.level.unwrap_or(1));

        let weight = 0.25 + (pr - 1.0) / 8.0;
        let blend = (1.0 - weight) * ((t - 1.0) / 2.0) + weight * ((l - 1.0) / 4.0);

        let min = self.min as f64;
        let max = self.max as f64;
        (min + (max - min) * blend + 0.5).floor() as i64
    }
}

/// A resolved token value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedValue {
    /// Concrete number (ranged or literal digits).
    Integer(i64),
    /// Ordered selectable indices, `1..=N`.
    Sequence(SmallVec<[u32; 8]>),
    /// Unparsed text such as a class name.
    Literal(String),
}

impl ResolvedValue {
    /// Get the integer, if this is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ResolvedValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the index sequence, if this is one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[u32]> {
        match self {
            ResolvedValue::Sequence(indices) => Some(indices.as_slice()),
            _ => None,
        }
    }

    /// Get the literal text, if this is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ResolvedValue::Literal(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedValue::Integer(value) => write!(f, "{}", value),
            ResolvedValue::Sequence(indices) => {
                f.write_str("[")?;
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", index)?;
                }
                f.write_str("]")
            }
            ResolvedValue::Literal(text) => f.write_str(text),
        }
    }
}

/// Why a token failed to resolve.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ResolveError {
    /// `R<n>` with no table entry.
    #[error("invalid ranged value R{0}")]
    UnknownRangedValue(u32),

    /// `max(N)` above [`MAX_INDEX_RANGE`].
    #[error("index range max({requested}) exceeds limit of {limit}")]
    IndexRangeTooLarge { requested: u64, limit: u32 },
}

fn all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve raw token text.
///
/// `max(N)` is capped at [`MAX_INDEX_RANGE`]: a larger `N` yields
/// [`ResolveError::IndexRangeTooLarge`] instead of the sequence `1..=N`,
/// so the parameter is dropped (or the effect rejected in strict mode).
///
/// ```
/// use spell_battle::effects::{resolve_raw, ResolvedValue, Scaling};
///
/// let value = resolve_raw("R3", Scaling::new(3, 2, 3)).unwrap();
/// assert_eq!(value, ResolvedValue::Integer(18));
/// ```
pub fn resolve_raw(raw: &str, scaling: Scaling) -> Result<ResolvedValue, ResolveError> {
    if let Some(digits) = raw.strip_prefix('R') {
        if (1..=2).contains(&digits.len()) && all_digits(digits) {
            let r_number: u32 = digits.parse().unwrap_or(0);
            return RangedValueTable::scaled(r_number, scaling)
                .map(ResolvedValue::Integer)
                .ok_or(ResolveError::UnknownRangedValue(r_number));
        }
    }

    if let Some(inner) = raw.strip_prefix("max(").and_then(|rest| rest.strip_suffix(')')) {
        if all_digits(inner) {
            let requested = inner.parse::<u64>().unwrap_or(u64::MAX);
            if requested > u64::from(MAX_INDEX_RANGE) {
                return Err(ResolveError::IndexRangeTooLarge {
                    requested,
                    limit: MAX_INDEX_RANGE,
                });
            }
            // Bounded by MAX_INDEX_RANGE above
            let count = requested as u32;
            return Ok(ResolvedValue::Sequence((1..=count).collect()));
        }
    }

    if all_digits(raw) {
        if let Ok(value) = raw.parse::<i64>() {
            return Ok(ResolvedValue::Integer(value));
        }
    }

    Ok(ResolvedValue::Literal(raw.to_string()))
}

/// Resolve an optional token. Absent stays absent; failures are logged
/// and become absent.
pub fn resolve(raw: Option<&str>, scaling: Scaling) -> Option<ResolvedValue> {
    let raw = raw?;
    match resolve_raw(raw, scaling) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(raw, %error, "token did not resolve");
            None
        }
    }
}
