//! Process-wide conversation state
//!
//! `SharedState` is the single synchronization boundary between the capture,
//! orchestrator, synthesis, and maintenance contexts. Every operation runs
//! under one lock, so no caller ever observes a half-applied update.

pub mod shared;
pub mod short_term;

pub use shared::{FlagSnapshot, SharedState, StateSnapshot, Trigger, TurnDecision};
pub use short_term::{ShortTermLog, Speaker};
