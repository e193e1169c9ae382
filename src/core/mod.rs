//! Core session types: turn ownership, RNG, weighted decisions, configuration.
//!
//! Everything here is independent of the effect-code grammar. The
//! effect and battle modules build on these pieces.

pub mod owner;
pub mod rng;
pub mod decision;
pub mod config;

pub use owner::TurnOwner;
pub use rng::{clamp_face, BattleRng, BattleRngState, DieRoller, RngError, ScriptedDice, DIE_FACES};
pub use decision::{normalize_weights, WeightError, WeightedOption};
pub use config::{
    BattleConfig, DEFAULT_ANIMATION_DELAY, DEFAULT_AUTO_TRIGGER_DELAY, DEFAULT_ROLL_DELAY,
};
