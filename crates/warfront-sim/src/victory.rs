//! Win determination.
//!
//! Pure functions over the match state. `evaluate_win_condition` is asked
//! after every mutation of a live match; `premature_winner` is a separate
//! path for a match torn down before any win condition held (one side
//! left, server shutdown).

use warfront_core::enums::MatchResult;
use warfront_core::state::RoundView;
use warfront_core::topology::ScoreMode;
use warfront_core::types::{PerTeam, Team};

use crate::scoreboard::ScoreBoard;

/// State the win evaluation reads.
#[derive(Debug, Clone, Copy)]
pub struct WinInputs<'a> {
    pub scores: &'a ScoreBoard,
    /// Team holding every objective of the map's hold-all kind.
    pub holds_all: Option<Team>,
    /// The match time limit has run out.
    pub time_up: bool,
    /// Team credited with the most recent capture.
    pub last_capture: Option<Team>,
}

/// Decide a single-round match, or `None` while it should continue.
///
/// Checked in order: a race score reaching its limit, an elimination pool
/// reaching zero, one team holding every hold-all objective, and finally
/// the time limit (higher score, then the last team to capture, else a
/// draw).
pub fn evaluate_win_condition(inputs: &WinInputs<'_>) -> Option<MatchResult> {
    if let Some(team) = inputs.scores.race_leader_at_limit() {
        return Some(MatchResult::Victory(team));
    }
    if let Some(loser) = inputs.scores.depleted() {
        return Some(MatchResult::Victory(loser.opponent()));
    }
    if let Some(team) = inputs.holds_all {
        return Some(MatchResult::Victory(team));
    }
    if !inputs.time_up {
        return None;
    }
    Some(
        higher(inputs.scores.scores())
            .or(inputs.last_capture)
            .map_or(MatchResult::Draw, MatchResult::Victory),
    )
}

/// Winner of a match ended before any win condition held. Compares scores
/// only (unscored maps skip straight to population), then the number of
/// players still present. `None` when both are level.
pub fn premature_winner(scores: &ScoreBoard, population: PerTeam<u32>) -> Option<Team> {
    let by_score = match scores.mode() {
        ScoreMode::Unscored => None,
        ScoreMode::Race { .. } | ScoreMode::Elimination { .. } => higher(scores.scores()),
    };
    by_score.or_else(|| higher(population))
}

/// Result of a two-round relay: the attackers with the lower elapsed time
/// win; equal times are a draw.
pub fn relay_result(rounds: &[RoundView]) -> MatchResult {
    match rounds {
        [first, second, ..] => match first.elapsed_ms.cmp(&second.elapsed_ms) {
            std::cmp::Ordering::Less => MatchResult::Victory(first.attackers),
            std::cmp::Ordering::Greater => MatchResult::Victory(second.attackers),
            std::cmp::Ordering::Equal => MatchResult::Draw,
        },
        [only] if only.completed => MatchResult::Victory(only.attackers),
        _ => MatchResult::Draw,
    }
}

fn higher(values: PerTeam<u32>) -> Option<Team> {
    match values.a.cmp(&values.b) {
        std::cmp::Ordering::Greater => Some(Team::A),
        std::cmp::Ordering::Less => Some(Team::B),
        std::cmp::Ordering::Equal => None,
    }
}
