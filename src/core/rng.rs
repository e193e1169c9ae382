//! Deterministic random number generation for battle sessions.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical die sequences
//! - **Injectable**: The engine only sees the [`DieRoller`] trait, so tests
//!   can script exact rolls with [`ScriptedDice`]
//! - **Streams**: Independent named streams via [`BattleRng::for_context`]
//! - **Serializable**: O(1) state capture and restore
//!
//! ## Usage
//!
//! ```
//! use spell_battle::core::{BattleRng, DieRoller};
//!
//! let mut rng = BattleRng::new(42);
//! let roll = rng.roll_die();
//! assert!((1..=6).contains(&roll));
//!
//! // Same seed, same sequence
//! let mut a = BattleRng::new(7);
//! let mut b = BattleRng::new(7);
//! assert_eq!(a.roll_die(), b.roll_die());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

use super::decision::{normalize_weights, WeightError};

/// Number of faces on the battle die.
pub const DIE_FACES: u8 = 6;

/// Errors from the bounded random helpers.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RngError {
    /// Lower bound above upper bound.
    #[error("min {min} cannot be greater than max {max}")]
    InvertedRange { min: f64, max: f64 },

    /// NaN or infinite bound, or a span too wide to represent.
    #[error("range bounds must be finite, got [{min}, {max})")]
    NonFinite { min: f64, max: f64 },

    /// Probability outside `[0, 1]`.
    #[error("probability must be between 0 and 1, got {0}")]
    InvalidProbability(f64),
}

/// Source of uniform die results in `1..=6`.
///
/// The turn engine and the roll-again gate draw every die through this
/// trait so sequences are reproducible in tests.
pub trait DieRoller {
    /// Roll one six-sided die.
    fn roll_die(&mut self) -> u8;
}

impl<D: DieRoller + ?Sized> DieRoller for &mut D {
    fn roll_die(&mut self) -> u8 {
        (**self).roll_die()
    }
}

impl<D: DieRoller + ?Sized> DieRoller for Box<D> {
    fn roll_die(&mut self) -> u8 {
        (**self).roll_die()
    }
}

/// Deterministic RNG for battle sessions.
///
/// Uses ChaCha8 for speed while keeping good statistical quality.
#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an independent stream for a named purpose
    /// (e.g. "turn-dice" vs "roll-again").
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;

        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        let context_seed = hasher.finish();

        Self {
            inner: ChaCha8Rng::seed_from_u64(context_seed),
            seed: context_seed,
        }
    }

    /// Random integer between `min` and `max`, both inclusive.
    pub fn random_int(&mut self, min: i64, max: i64) -> Result<i64, RngError> {
        if min > max {
            return Err(RngError::InvertedRange {
                min: min as f64,
                max: max as f64,
            });
        }
        Ok(self.inner.gen_range(min..=max))
    }

    /// Random float in `[min, max)`. Returns `min` when the range is empty.
    ///
    /// Bounds must be finite and `max - min` must not overflow.
    pub fn random_float(&mut self, min: f64, max: f64) -> Result<f64, RngError> {
        if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
            return Err(RngError::NonFinite { min, max });
        }
        if min > max {
            return Err(RngError::InvertedRange { min, max });
        }
        if min == max {
            return Ok(min);
        }
        Ok(self.inner.gen_range(min..max))
    }

    /// Returns true with the given probability.
    pub fn chance(&mut self, probability: f64) -> Result<bool, RngError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(RngError::InvalidProbability(probability));
        }
        Ok(self.inner.gen::<f64>() < probability)
    }

    /// Pick a key with probability proportional to its weight.
    ///
    /// Weights are validated with [`normalize_weights`]: at least two
    /// options, every weight finite and non-negative, positive total.
    /// A zero weight is never picked.
    pub fn make_decision<'a, K>(&mut self, weights: &'a [(K, f64)]) -> Result<&'a K, WeightError> {
        let normalized = normalize_weights(weights)?;
        let roll = self.inner.gen::<f64>();

        let mut cumulative = 0.0;
        for option in &normalized {
            cumulative += option.probability;
            if roll < cumulative && option.weight > 0.0 {
                return Ok(&weights[option.index].0);
            }
        }

        // Float precision: fall back to the last option that can be picked
        let last = normalized
            .iter()
            .rev()
            .find(|option| option.weight > 0.0)
            .map_or(weights.len() - 1, |option| option.index);
        Ok(&weights[last].0)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> BattleRngState {
        BattleRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &BattleRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl DieRoller for BattleRng {
    fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=DIE_FACES)
    }
}

/// Clamp a die result into `1..=6`, logging when it was out of range.
#[must_use]
pub fn clamp_face(roll: u8) -> u8 {
    let face = roll.clamp(1, DIE_FACES);
    if face != roll {
        tracing::warn!(roll, face, "die result out of range, clamped");
    }
    face
}

/// Serializable RNG state for checkpointing.
///
/// Uses the ChaCha8 word position, so capture is O(1) regardless of how
/// many dice have been rolled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}

/// A die that replays a fixed sequence, cycling when exhausted.
///
/// Intended for tests and replays. Values are passed through untouched;
/// consumers clamp out-of-range faces.
///
/// ```
/// use spell_battle::core::{DieRoller, ScriptedDice};
///
/// let mut dice = ScriptedDice::new([2, 5]);
/// assert_eq!(dice.roll_die(), 2);
/// assert_eq!(dice.roll_die(), 5);
/// assert_eq!(dice.roll_die(), 2);
/// assert_eq!(dice.draws(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDice {
    rolls: Vec<u8>,
    cursor: usize,
    draws: usize,
}

impl ScriptedDice {
    /// Create a scripted die. An empty script always rolls 1.
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            cursor: 0,
            draws: 0,
        }
    }

    /// How many dice have been drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl DieRoller for ScriptedDice {
    fn roll_die(&mut self) -> u8 {
        self.draws += 1;
        if self.rolls.is_empty() {
            return 1;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = BattleRng::new(42);
        let mut rng2 = BattleRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.roll_die(), rng2.roll_die());
        }
    }

    #[test]
    fn test_die_in_range() {
        let mut rng = BattleRng::new(3);
        let mut seen = [false; 6];
        for _ in 0..600 {
            let roll = rng.roll_die();
            assert!((1..=6).contains(&roll));
            seen[usize::from(roll - 1)] = true;
        }
        assert!(seen.iter().all(|s| *s), "every face should appear in 600 rolls");
    }

    #[test]
    fn test_clamp_face() {
        assert_eq!(clamp_face(0), 1);
        assert_eq!(clamp_face(4), 4);
        assert_eq!(clamp_face(9), 6);
    }

    #[test]
    fn test_context_is_deterministic() {
        let rng1 = BattleRng::new(42);
        let rng2 = BattleRng::new(42);

        let mut ctx1 = rng1.for_context("roll-again");
        let mut ctx2 = rng2.for_context("roll-again");

        for _ in 0..10 {
            assert_eq!(ctx1.roll_die(), ctx2.roll_die());
        }
    }

    #[test]
    fn test_random_int_inclusive_and_errors() {
        let mut rng = BattleRng::new(9);
        for _ in 0..50 {
            let value = rng.random_int(3, 4).unwrap();
            assert!(value == 3 || value == 4);
        }
        assert_eq!(rng.random_int(5, 5).unwrap(), 5);
        assert!(matches!(rng.random_int(6, 1), Err(RngError::InvertedRange { .. })));
    }

    #[test]
    fn test_random_float_and_chance() {
        let mut rng = BattleRng::new(11);
        let value = rng.random_float(0.5, 2.0).unwrap();
        assert!((0.5..2.0).contains(&value));
        assert_eq!(rng.random_float(1.5, 1.5).unwrap(), 1.5);
        assert!(rng.random_float(2.0, 1.0).is_err());

        assert!(!rng.chance(0.0).unwrap());
        assert!(rng.chance(1.0).unwrap());
        assert_eq!(rng.chance(1.5), Err(RngError::InvalidProbability(1.5)));
    }

    #[test]
    fn test_random_float_rejects_non_finite_bounds() {
        let mut rng = BattleRng::new(1);
        assert!(matches!(rng.random_float(f64::NAN, 1.0), Err(RngError::NonFinite { .. })));
        assert!(matches!(rng.random_float(0.0, f64::NAN), Err(RngError::NonFinite { .. })));
        assert!(matches!(rng.random_float(0.0, f64::INFINITY), Err(RngError::NonFinite { .. })));
        assert!(matches!(
            rng.random_float(f64::NEG_INFINITY, 0.0),
            Err(RngError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_random_float_rejects_overflowing_span() {
        let mut rng = BattleRng::new(1);
        assert!(matches!(
            rng.random_float(f64::MIN, f64::MAX),
            Err(RngError::NonFinite { .. })
        ));
        let value = rng.random_float(-1e300, 1e300).unwrap();
        assert!((-1e300..1e300).contains(&value));
    }

    #[test]
    fn test_make_decision_respects_zero_weight() {
        let mut rng = BattleRng::new(5);
        let weights = [("sword", 0.0), ("shield", 80.0)];
        for _ in 0..50 {
            assert_eq!(*rng.make_decision(&weights).unwrap(), "shield");
        }
    }

    #[test]
    fn test_make_decision_rejects_bad_weights() {
        let mut rng = BattleRng::new(5);
        assert_eq!(
            rng.make_decision(&[("only", 1.0)]),
            Err(WeightError::TooFewOptions(1))
        );
        assert!(rng.make_decision(&[("a", 0.0), ("b", 0.0)]).is_err());
    }

    #[test]
    fn test_state_serialization() {
        let mut rng = BattleRng::new(42);

        for _ in 0..100 {
            rng.roll_die();
        }

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.roll_die()).collect();

        let mut restored = BattleRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.roll_die()).collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_state_serde() {
        let state = BattleRngState {
            seed: 42,
            word_pos: 12345,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: BattleRngState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }

    #[test]
    fn test_scripted_dice_cycles() {
        let mut dice = ScriptedDice::new([3, 4]);
        let rolls: Vec<_> = (0..5).map(|_| dice.roll_die()).collect();
        assert_eq!(rolls, vec![3, 4, 3, 4, 3]);
        assert_eq!(dice.draws(), 5);

        let mut empty = ScriptedDice::default();
        assert_eq!(empty.roll_die(), 1);
    }

    #[test]
    fn test_die_roller_through_mut_ref() {
        fn draw(mut dice: impl DieRoller) -> u8 {
            dice.roll_die()
        }

        let mut dice = ScriptedDice::new([6]);
        assert_eq!(draw(&mut dice), 6);
        assert_eq!(dice.draws(), 1);
    }
}
