//! Scoreboard: per-team score or elimination pool, periodic reward
//! batching and near-victory notices.
//!
//! Race scores count up to `max_score`; elimination pools count down to
//! zero. Both are clamped to their range. Once the match is decided the
//! board is locked and rejects every further mutation.

use serde::{Deserialize, Serialize};

use warfront_core::effects::{Broadcast, Effect, Notice, RewardGrant};
use warfront_core::enums::RewardReason;
use warfront_core::topology::{PeriodicReward, RewardRules, ScoreMode, ScoringRules};
use warfront_core::types::{PerTeam, Team};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    mode: ScoreMode,
    near_threshold: Option<u32>,
    tracks: Vec<PeriodicReward>,
    scores: PerTeam<u32>,
    /// Resources gained toward the next batch, one entry per reward track.
    periodic: PerTeam<Vec<u32>>,
    near_notified: PerTeam<bool>,
    locked: bool,
}

impl ScoreBoard {
    pub fn new(scoring: &ScoringRules, rewards: &RewardRules) -> Self {
        let mut board = Self {
            mode: scoring.mode,
            near_threshold: scoring.near_threshold,
            tracks: rewards.periodic.clone(),
            scores: PerTeam::default(),
            periodic: PerTeam::default(),
            near_notified: PerTeam::default(),
            locked: false,
        };
        board.reset();
        board
    }

    pub fn reset(&mut self) {
        let start = match self.mode {
            ScoreMode::Elimination { initial_pool } => initial_pool,
            ScoreMode::Race { .. } | ScoreMode::Unscored => 0,
        };
        self.scores = PerTeam::splat(start);
        self.periodic = PerTeam::splat(vec![0; self.tracks.len()]);
        self.near_notified = PerTeam::splat(false);
        self.locked = false;
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team]
    }

    pub fn scores(&self) -> PerTeam<u32> {
        self.scores
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Freeze the board. Called once the match is decided.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Upper bound of a team's score.
    pub fn limit(&self) -> Option<u32> {
        match self.mode {
            ScoreMode::Race { max_score } => Some(max_score),
            ScoreMode::Elimination { initial_pool } => Some(initial_pool),
            ScoreMode::Unscored => None,
        }
    }

    /// Change a team's score by `delta`, clamped to the board's range.
    pub fn add_points(&mut self, team: Team, delta: i32) -> Vec<Effect> {
        if self.locked {
            tracing::debug!(
                target: "warfront::score",
                team = %team,
                delta,
                "score.locked"
            );
            return Vec::new();
        }
        let Some(limit) = self.limit() else {
            return Vec::new();
        };

        let before = self.scores[team];
        if before > limit {
            // Only reachable through a board restored from bad data.
            tracing::error!(
                target: "warfront::score",
                team = %team,
                score = before,
                limit,
                "score.invariant_violated"
            );
        }
        let after = (i64::from(before) + i64::from(delta)).clamp(0, i64::from(limit)) as u32;
        if after == before {
            return Vec::new();
        }
        self.scores[team] = after;

        let mut effects = vec![Effect::ScoreChanged { team, score: after }];
        effects.extend(self.near_notice(team));
        effects
    }

    /// Team whose race score has reached the limit.
    pub fn race_leader_at_limit(&self) -> Option<Team> {
        let ScoreMode::Race { max_score } = self.mode else {
            return None;
        };
        Team::ALL.into_iter().find(|&team| self.scores[team] >= max_score)
    }

    /// Team whose elimination pool is empty.
    pub fn depleted(&self) -> Option<Team> {
        if !matches!(self.mode, ScoreMode::Elimination { .. }) {
            return None;
        }
        Team::ALL.into_iter().find(|&team| self.scores[team] == 0)
    }

    /// Add resources toward every periodic reward track. A track that
    /// crosses its threshold emits one grant covering all whole batches and
    /// keeps the remainder.
    pub fn accumulate_periodic(&mut self, team: Team, resources: u32) -> Vec<Effect> {
        if self.locked || resources == 0 {
            return Vec::new();
        }
        let mut effects = Vec::new();
        for (track, accumulated) in self.tracks.iter().zip(self.periodic[team].iter_mut()) {
            *accumulated += resources;
            let batches = *accumulated / track.threshold;
            if batches == 0 {
                continue;
            }
            *accumulated %= track.threshold;
            effects.push(Effect::Reward(RewardGrant {
                team,
                honor: track.honor * batches,
                reputation: track.reputation * batches,
                reason: RewardReason::Periodic,
            }));
        }
        effects
    }

    fn near_notice(&mut self, team: Team) -> Option<Effect> {
        let threshold = self.near_threshold?;
        if self.near_notified[team] {
            return None;
        }
        let score = self.scores[team];
        let notice = match self.mode {
            ScoreMode::Race { .. } if score >= threshold => Notice::NearVictory,
            ScoreMode::Elimination { .. } if score <= threshold => Notice::NearDefeat,
            _ => return None,
        };
        self.near_notified[team] = true;
        tracing::info!(
            target: "warfront::score",
            team = %team,
            score,
            notice = ?notice,
            "score.near_threshold"
        );
        Some(Effect::Broadcast(Broadcast {
            notice,
            team: Some(team),
            objective: None,
            key: None,
        }))
    }
}
