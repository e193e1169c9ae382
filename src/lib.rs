//! # spell-battle
//!
//! Spell effect codes and the dice-driven turn sequence that triggers them.
//!
//! ## Design Principles
//!
//! 1. **Closed Grammar**: Effect codes are plain strings, but every base
//!    code maps onto one variant of a closed enum. Dispatch is an
//!    exhaustive match, never a string table.
//!
//! 2. **Total Parsing**: Any string parses. Malformed codes surface as
//!    "no handler" outcomes, not errors.
//!
//! 3. **Injected Effects**: Dice, spell handlers and battle hooks are
//!    traits. Tests script them; hosts plug in real combat.
//!
//! ## Architecture
//!
//! - **Virtual Clock**: Pacing delays are scheduled continuations the host
//!   advances. Nothing sleeps, nothing spawns.
//!
//! - **Persistent Data Structures**: Snapshot history and the invocation
//!   journal use `im::Vector` for O(1) cloning.
//!
//! ## Modules
//!
//! - `core`: Turn ownership, RNG, weighted decisions, configuration
//! - `effects`: Effect-code grammar, value resolution, dispatch, roll-again
//! - `battle`: Turn engine, hooks, snapshots

pub mod core;
pub mod effects;
pub mod battle;

// Re-export commonly used types
pub use crate::core::{
    BattleConfig, BattleRng, BattleRngState, DieRoller, ScriptedDice, TurnOwner,
};

pub use crate::effects::{
    BaseCode, CallerContext, DecodeOutcome, EffectCode, EffectCodeBuilder, EffectDecoder,
    EffectDispatcher, EffectHandler, EffectLog, EffectParams, ParsedEffect, ResolvedParams,
    ResolvedValue, Scaling, SpellInvocation,
};

pub use crate::battle::{
    BattleEnd, BattleEvent, BattleHooks, BattlePhase, BattleSetup, BattleState, EngineError,
    EngineStatus, LoggingHooks, TurnEngine,
};
