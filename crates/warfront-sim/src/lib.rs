//! Match engine for WARFRONT.
//!
//! Owns the objectives, scoreboard and phase scheduler of a match, runs
//! the periodic systems for caller-supplied time deltas, and decides the
//! winner. Completely headless and deterministic: the same topology, seed,
//! interactions and deltas always produce the same effects.

pub mod arena;
pub mod engine;
pub mod registry;
pub mod scheduler;
pub mod scoreboard;
pub mod sink;
pub mod systems;
pub mod victory;
pub mod worker;

pub use arena::{Arena, ArenaError, MatchHandle};
pub use engine::{MatchEngine, MatchOptions};
pub use sink::EffectSink;
pub use warfront_core as core;

#[cfg(test)]
mod tests;
