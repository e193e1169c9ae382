//! Weighted decision helpers.
//!
//! A weight table is a slice of `(key, weight)` pairs. Weights can be any
//! non-negative finite numbers; zero means "never pick". Selection itself
//! lives on [`BattleRng::make_decision`](super::BattleRng::make_decision)
//! so every draw goes through the session's seeded RNG.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for a weight table.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WeightError {
    /// Fewer than two options supplied.
    #[error("provide at least 2 options, got {0}")]
    TooFewOptions(usize),

    /// A weight is NaN or infinite.
    #[error("weight at index {index} must be a finite number")]
    NonFinite { index: usize },

    /// A weight is below zero.
    #[error("weight at index {index} must be >= 0, got {weight}")]
    Negative { index: usize, weight: f64 },

    /// All weights are zero.
    #[error("total weight must be > 0")]
    ZeroTotal,
}

/// One validated entry of a weight table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedOption {
    /// Position of the entry in the original table.
    pub index: usize,
    /// Raw weight.
    pub weight: f64,
    /// `weight / total`.
    pub probability: f64,
}

/// Validate a weight table and attach normalized probabilities.
///
/// ```
/// use spell_battle::core::normalize_weights;
///
/// let options = normalize_weights(&[("a", 20.0), ("b", 80.0)]).unwrap();
/// assert_eq!(options[1].probability, 0.8);
/// ```
pub fn normalize_weights<K>(weights: &[(K, f64)]) -> Result<Vec<WeightedOption>, WeightError> {
    if weights.len() < 2 {
        return Err(WeightError::TooFewOptions(weights.len()));
    }

    for (index, (_, weight)) in weights.iter().enumerate() {
        if !weight.is_finite() {
            return Err(WeightError::NonFinite { index });
        }
        if *weight < 0.0 {
            return Err(WeightError::Negative { index, weight: *weight });
        }
    }

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(WeightError::ZeroTotal);
    }

    Ok(weights
        .iter()
        .enumerate()
        .map(|(index, (_, weight))| WeightedOption {
            index,
            weight: *weight,
            probability: weight / total,
        })
        .collect())
}
