//! Core types and definitions for the WARFRONT battleground engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! teams, objective states, interactions, effects, static map topology,
//! snapshots, and constants. It has no dependency on the engine itself.

pub mod clock;
pub mod constants;
pub mod effects;
pub mod enums;
pub mod interactions;
pub mod state;
pub mod topology;
pub mod types;

pub use clock::Clock;
pub use types::{MatchTime, ObjectiveId, PerTeam, Team};

#[cfg(test)]
mod tests;
