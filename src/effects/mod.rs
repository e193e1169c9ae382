//! Spell effect codes: grammar, value resolution and dispatch.
//!
//! An effect code is a compact string such as `RAGUA{R3}T{2}D{1}-323`.
//! Decoding runs in one direction:
//!
//! - `ParsedEffect`: splits the code into base, tokens and scaling
//! - `resolve_raw`: turns token text into integers, index lists or literals
//! - `RollAgain`: optional coin-flip gate for `RA` codes
//! - `EffectDispatcher`: routes the base to an `EffectHandler`
//!
//! `EffectDecoder` chains all of them.
//!
//! ## Design
//!
//! The set of bases is closed (`BaseCode`), so dispatch is an exhaustive
//! match rather than a lookup table. Handlers receive records and decide
//! what they mean; the stock `EffectLog` only journals them.

mod base;
mod code;
mod decoder;
mod dispatch;
mod parser;
mod value;

pub use base::{BaseCode, EffectFamily, ParamSpec, StatFocus, TargetGroup, UnknownBaseCode};
pub use code::{BuildError, EffectCode, EffectCodeBuilder};
pub use decoder::{EffectDecoder, RollAgain, RollAgainVerdict};
pub use dispatch::{
    CallerContext, DecodeOutcome, EffectDispatcher, EffectHandler, EffectLog, EffectParams,
    ResolvedParams, SpellInvocation,
};
pub use parser::{parse, ParsedEffect, ROLL_AGAIN_PREFIX};
pub use value::{
    resolve, resolve_raw, RangedValueEntry, RangedValueTable, ResolveError, ResolvedValue,
    Scaling, MAX_INDEX_RANGE, RANGED_VALUE_TABLE,
};
