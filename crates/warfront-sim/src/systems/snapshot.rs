//! Snapshot system: builds the serializable view of a match.

use warfront_core::enums::MatchResult;
use warfront_core::state::MatchSnapshot;
use warfront_core::types::{MatchTime, Team};

use crate::registry::ObjectiveRegistry;
use crate::scheduler::MatchScheduler;
use crate::scoreboard::ScoreBoard;

pub fn build_snapshot(
    map: &str,
    time: MatchTime,
    scheduler: &MatchScheduler,
    scoreboard: &ScoreBoard,
    registry: &ObjectiveRegistry,
    last_capture: Option<Team>,
    result: Option<MatchResult>,
) -> MatchSnapshot {
    MatchSnapshot {
        map: map.to_owned(),
        time,
        phase: scheduler.phase(),
        phase_remaining_ms: scheduler.phase_remaining_ms(),
        attackers: scheduler.attackers(),
        scores: scoreboard.scores(),
        objectives: registry.views(),
        rounds: scheduler.rounds().to_vec(),
        last_capture,
        result,
    }
}
