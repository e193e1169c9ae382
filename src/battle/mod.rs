//! Battle turn sequencing.
//!
//! - `TurnEngine`: the phase state machine
//! - `BattleState`: per-transition snapshot
//! - `BattleHooks`: host callbacks (turn effects, death checks)
//! - `VirtualClock`: scheduled continuations for pacing delays
//!
//! The engine is synchronous. Hosts feed it [`BattleEvent`]s and advance
//! its clock; it never sleeps or spawns.

mod engine;
mod hooks;
mod schedule;
mod state;

pub use engine::{BattleEnd, BattleEvent, EngineError, EngineStatus, TurnEngine};
pub use hooks::{BattleHooks, BattleSetup, LoggingHooks};
pub use schedule::{Continuation, Scheduled, VirtualClock};
pub use state::{BattlePhase, BattleState};
