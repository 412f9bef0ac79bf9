//! Static per-map topology: objectives, pairing rules, scoring, schedule
//! and reward tables.
//!
//! A topology is plain data, loaded once per map and validated before any
//! match is created from it. Every map-specific behaviour of the engine is
//! driven from here.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::enums::{CaptureMode, ObjectiveKind};
use crate::types::{ObjectiveId, Team};

/// Complete static description of one battleground map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Short map name, used in logs.
    pub map: String,
    pub objectives: Vec<ObjectiveDef>,
    #[serde(default)]
    pub pairs: Vec<PairRule>,
    pub scoring: ScoringRules,
    #[serde(default)]
    pub schedule: ScheduleRules,
    #[serde(default)]
    pub rewards: RewardRules,
    #[serde(default)]
    pub win: WinRules,
}

/// Static definition of one objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDef {
    pub id: ObjectiveId,
    /// Text/broadcast key, e.g. `"ab.stables"`.
    pub key: String,
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub initial: Holder,
    #[serde(default)]
    pub capture: CaptureMode,
    /// Assault window override (ms).
    #[serde(default)]
    pub capture_ms: Option<u64>,
    /// Home team of a team flag. `None` for a neutral (center) flag.
    #[serde(default)]
    pub home: Option<Team>,
    #[serde(default)]
    pub world_state: Option<u32>,
    #[serde(default)]
    pub position: Vec3,
    /// Objectives that must be destroyed before this one accepts any
    /// interaction (gate chains).
    #[serde(default)]
    pub requires_destroyed: Vec<ObjectiveId>,
    /// Pool/score lost by the team whose structure is destroyed.
    #[serde(default)]
    pub destroy_penalty: u32,
    /// Reward for capturing or destroying this objective.
    #[serde(default)]
    pub reward: RewardTable,
    /// Periodic yield while controlled (AV mines).
    #[serde(default, rename = "yield")]
    pub yields: Option<YieldRule>,
}

impl ObjectiveDef {
    /// Effective assault window.
    pub fn capture_window_ms(&self) -> u64 {
        self.capture_ms.unwrap_or(DEFAULT_CAPTURE_MS)
    }
}

/// Who holds an objective when a match (or round) starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holder {
    #[default]
    Neutral,
    TeamA,
    TeamB,
    /// Relay maps: the team attacking this round.
    Attackers,
    /// Relay maps: the team defending this round.
    Defenders,
}

impl Holder {
    /// Resolve to a concrete team given this round's attackers.
    pub fn resolve(self, attackers: Option<Team>) -> Option<Team> {
        match self {
            Holder::Neutral => None,
            Holder::TeamA => Some(Team::A),
            Holder::TeamB => Some(Team::B),
            Holder::Attackers => attackers,
            Holder::Defenders => attackers.map(Team::opponent),
        }
    }

    fn is_role_relative(self) -> bool {
        matches!(self, Holder::Attackers | Holder::Defenders)
    }
}

/// Cross-objective rule between two paired structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRule {
    pub first: ObjectiveId,
    pub second: ObjectiveId,
    pub policy: PairPolicy,
}

impl PairRule {
    /// The other member of the pair, if `id` belongs to it.
    pub fn partner_of(&self, id: ObjectiveId) -> Option<ObjectiveId> {
        if id == self.first {
            Some(self.second)
        } else if id == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairPolicy {
    /// Destroying one member after its partner is already destroyed grants
    /// no honor.
    SuppressRewardWhenPartnerDestroyed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    #[serde(default)]
    pub honor: u32,
    #[serde(default)]
    pub reputation: u32,
}

impl RewardTable {
    pub fn is_empty(&self) -> bool {
        self.honor == 0 && self.reputation == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldRule {
    pub interval_ms: u64,
    /// Points per interval; negative drains.
    pub points: i32,
    #[serde(default)]
    pub target: YieldTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldTarget {
    /// The controlling team.
    #[default]
    Holder,
    /// The controlling team's opponent.
    Opponent,
}

/// How team scores are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScoreMode {
    /// Scores count up; first to `max_score` wins.
    Race { max_score: u32 },
    /// Pools count down from `initial_pool`; the first to zero loses.
    Elimination { initial_pool: u32 },
    /// No score (relay maps decided on time).
    Unscored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub mode: ScoreMode,
    /// Race: warn once at or above this score. Elimination: warn once at or
    /// below this pool.
    #[serde(default)]
    pub near_threshold: Option<u32>,
    /// Map-level resource ticks keyed by number of objectives held.
    #[serde(default)]
    pub resource_ticks: Option<ResourceTicks>,
    #[serde(default)]
    pub flags: FlagRules,
    #[serde(default)]
    pub kills: KillRules,
}

/// Resource tick table. Index `n` of each vector applies while a team
/// controls `n` counted objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTicks {
    pub counted: Vec<ObjectiveKind>,
    pub intervals_ms: Vec<u64>,
    pub points: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRules {
    #[serde(default = "default_flag_drop_ms")]
    pub drop_ms: u64,
    #[serde(default = "default_flag_respawn_ms")]
    pub respawn_ms: u64,
    /// Points per capture keyed by non-flag objectives held; the last
    /// entry applies beyond the table.
    #[serde(default = "default_capture_points")]
    pub capture_points: Vec<u32>,
    #[serde(default)]
    pub capture_reward: RewardTable,
}

impl Default for FlagRules {
    fn default() -> Self {
        Self {
            drop_ms: default_flag_drop_ms(),
            respawn_ms: default_flag_respawn_ms(),
            capture_points: default_capture_points(),
            capture_reward: RewardTable::default(),
        }
    }
}

fn default_flag_drop_ms() -> u64 {
    DEFAULT_FLAG_DROP_MS
}

fn default_flag_respawn_ms() -> u64 {
    DEFAULT_FLAG_RESPAWN_MS
}

fn default_capture_points() -> Vec<u32> {
    vec![1]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillRules {
    #[serde(default = "default_player_penalty")]
    pub player_penalty: u32,
    #[serde(default)]
    pub captain_penalty: u32,
    #[serde(default)]
    pub captain_reward: RewardTable,
    /// Killing a commander ends the match for the victim's side.
    #[serde(default)]
    pub commander_ends_match: bool,
}

impl Default for KillRules {
    fn default() -> Self {
        Self {
            player_penalty: default_player_penalty(),
            captain_penalty: 0,
            captain_reward: RewardTable::default(),
            commander_ends_match: false,
        }
    }
}

fn default_player_penalty() -> u32 {
    DEFAULT_PLAYER_KILL_PENALTY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRules {
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    /// Warmup announcements as time remaining before the doors open (ms).
    #[serde(default = "default_announcements")]
    pub announce_at_ms: Vec<u64>,
    /// Match duration limit for single-round maps.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    #[serde(default)]
    pub relay: Option<RelayRules>,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            announce_at_ms: default_announcements(),
            time_limit_ms: None,
            relay: None,
        }
    }
}

fn default_warmup_ms() -> u64 {
    DEFAULT_WARMUP_MS
}

fn default_announcements() -> Vec<u64> {
    DEFAULT_ANNOUNCEMENTS_MS.to_vec()
}

/// Two-round relay: teams swap attacker and defender roles between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRules {
    pub round_ms: u64,
    pub intermission_ms: u64,
    #[serde(default)]
    pub first_attackers: AttackerPick,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackerPick {
    /// Chosen from the match seed.
    #[default]
    Seeded,
    TeamA,
    TeamB,
}

/// Periodic payout: every `threshold` resources gained grant one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicReward {
    pub threshold: u32,
    #[serde(default)]
    pub honor: u32,
    #[serde(default)]
    pub reputation: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRules {
    #[serde(default)]
    pub periodic: Vec<PeriodicReward>,
    #[serde(default)]
    pub victory: RewardTable,
    #[serde(default)]
    pub defeat: RewardTable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRules {
    /// A team holding every objective of this kind wins (or, on relay maps,
    /// completes its round).
    #[serde(default)]
    pub hold_all: Option<ObjectiveKind>,
}

/// Configuration errors. Fatal at match creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("map {map} defines no objectives")]
    NoObjectives { map: String },
    #[error("objective at index {index} has id {found}, expected #{index}")]
    IdOutOfOrder { index: usize, found: ObjectiveId },
    #[error("objective {referenced_by} references nonexistent objective {missing}")]
    UnknownObjective {
        referenced_by: ObjectiveId,
        missing: ObjectiveId,
    },
    #[error("objective {objective} requires {prerequisite}, which can never be destroyed")]
    PrerequisiteNotDestructible {
        objective: ObjectiveId,
        prerequisite: ObjectiveId,
    },
    #[error("pair rule references nonexistent objective {0}")]
    UnknownPairMember(ObjectiveId),
    #[error("pair rule pairs {0} with itself")]
    SelfPair(ObjectiveId),
    #[error("pair member {0} is not a destructible structure")]
    PairMemberNotStructure(ObjectiveId),
    #[error("resource tick table has {intervals} intervals but {points} point entries")]
    TickTableMismatch { intervals: usize, points: usize },
    #[error("resource tick table is empty")]
    EmptyTickTable,
    #[error("zero-length interval in a tick or yield rule")]
    ZeroInterval,
    #[error("periodic reward threshold must be positive")]
    ZeroThreshold,
    #[error("score limit must be positive")]
    ZeroScoreLimit,
    #[error("flag capture point table is empty")]
    EmptyCapturePoints,
    #[error("objective {0} uses a role-relative holder but the map has no relay schedule")]
    RoleHolderWithoutRelay(ObjectiveId),
    #[error("relay map needs a hold-all objective kind to complete a round")]
    RelayWithoutObjective,
    #[error("hold-all rule names {0:?} but no objective has that kind")]
    HoldAllKindMissing(ObjectiveKind),
    #[error("objective {0} cannot use progress capture")]
    ProgressNotSupported(ObjectiveId),
}

impl Topology {
    /// Check every cross-reference and table shape. Must pass before a match
    /// is created.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.objectives.is_empty() {
            return Err(TopologyError::NoObjectives {
                map: self.map.clone(),
            });
        }

        for (index, def) in self.objectives.iter().enumerate() {
            if def.id.index() != index {
                return Err(TopologyError::IdOutOfOrder {
                    index,
                    found: def.id,
                });
            }
        }

        for def in &self.objectives {
            for &prerequisite in &def.requires_destroyed {
                let target = self.objective(prerequisite).ok_or(
                    TopologyError::UnknownObjective {
                        referenced_by: def.id,
                        missing: prerequisite,
                    },
                )?;
                if !target.kind.is_structure() || prerequisite == def.id {
                    return Err(TopologyError::PrerequisiteNotDestructible {
                        objective: def.id,
                        prerequisite,
                    });
                }
            }
            if def.initial.is_role_relative() && !self.is_relay() {
                return Err(TopologyError::RoleHolderWithoutRelay(def.id));
            }
            if def.capture == CaptureMode::Progress
                && matches!(def.kind, ObjectiveKind::Flag | ObjectiveKind::Gate)
            {
                return Err(TopologyError::ProgressNotSupported(def.id));
            }
            if def.yields.is_some_and(|y| y.interval_ms == 0) {
                return Err(TopologyError::ZeroInterval);
            }
        }

        for pair in &self.pairs {
            if pair.first == pair.second {
                return Err(TopologyError::SelfPair(pair.first));
            }
            for id in [pair.first, pair.second] {
                let def = self
                    .objective(id)
                    .ok_or(TopologyError::UnknownPairMember(id))?;
                if !def.kind.is_structure() {
                    return Err(TopologyError::PairMemberNotStructure(id));
                }
            }
        }

        match self.scoring.mode {
            ScoreMode::Race { max_score: 0 } | ScoreMode::Elimination { initial_pool: 0 } => {
                return Err(TopologyError::ZeroScoreLimit);
            }
            _ => {}
        }

        if let Some(ticks) = &self.scoring.resource_ticks {
            if ticks.intervals_ms.len() != ticks.points.len() {
                return Err(TopologyError::TickTableMismatch {
                    intervals: ticks.intervals_ms.len(),
                    points: ticks.points.len(),
                });
            }
            if ticks.intervals_ms.is_empty() {
                return Err(TopologyError::EmptyTickTable);
            }
            // Index 0 (nothing held) never ticks, so a zero there is fine.
            if ticks.intervals_ms.iter().skip(1).any(|&ms| ms == 0) {
                return Err(TopologyError::ZeroInterval);
            }
        }

        if self.scoring.flags.capture_points.is_empty() {
            return Err(TopologyError::EmptyCapturePoints);
        }

        if self.rewards.periodic.iter().any(|p| p.threshold == 0) {
            return Err(TopologyError::ZeroThreshold);
        }

        if let Some(kind) = self.win.hold_all {
            if !self.objectives.iter().any(|def| def.kind == kind) {
                return Err(TopologyError::HoldAllKindMissing(kind));
            }
        } else if self.is_relay() {
            return Err(TopologyError::RelayWithoutObjective);
        }

        Ok(())
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&ObjectiveDef> {
        self.objectives.get(id.index())
    }

    pub fn is_relay(&self) -> bool {
        self.schedule.relay.is_some()
    }
}
