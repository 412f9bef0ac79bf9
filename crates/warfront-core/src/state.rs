//! Match snapshot: the complete observable state of one match.
//!
//! Snapshots are plain serializable values. Two matches fed the same
//! interactions and deltas produce byte-identical snapshot JSON.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{MatchTime, ObjectiveId, PerTeam, Team};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub map: String,
    pub time: MatchTime,
    pub phase: MatchPhase,
    /// Milliseconds left in the current phase, when the phase is timed.
    pub phase_remaining_ms: Option<u64>,
    /// Relay maps: current attackers.
    pub attackers: Option<Team>,
    pub scores: PerTeam<u32>,
    pub objectives: Vec<ObjectiveView>,
    pub rounds: Vec<RoundView>,
    pub last_capture: Option<Team>,
    pub result: Option<MatchResult>,
}

/// One objective as seen by the world layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveView {
    pub id: ObjectiveId,
    pub key: String,
    pub kind: ObjectiveKind,
    pub state: ObjectiveState,
    pub owner: Option<Team>,
    pub prev_owner: Option<Team>,
    pub prev_state: ObjectiveState,
    pub last_controlling_team: Option<Team>,
    /// Remaining time on the capture/drop/respawn window.
    pub timer_remaining_ms: u64,
    /// Capture bar for progress objectives.
    pub progress: i32,
}

/// A completed relay round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub attackers: Team,
    pub elapsed_ms: u64,
    /// Attackers reached the final objective before the round timed out.
    pub completed: bool,
}
