//! Effects emitted by the engine for the surrounding world layer.
//!
//! The engine never spawns, broadcasts or grants anything itself. Every
//! consequence of a transition is returned as an [`Effect`] value for an
//! effect sink to perform.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ObjectiveId, Team};

/// Broadcast key. The world layer maps it (plus the objective's text key)
/// to localized text and sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    Assaulted,
    Defended,
    Captured,
    /// Control lost without a new controller (progress objectives).
    Neutralized,
    Destroyed,
    FlagPickedUp,
    FlagDropped,
    FlagReturned,
    FlagCaptured,
    FlagRespawned,
    /// A team is close to winning on score.
    NearVictory,
    /// A team's elimination pool is running low.
    NearDefeat,
    /// Warmup announcement, `secs` before the doors open.
    StartingIn { secs: u32 },
    BattleBegun,
    RoundEnded { round: u8 },
    /// A reward was withheld by a pair rule.
    RewardSuppressed,
}

/// A chat/text broadcast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub notice: Notice,
    /// Team the message is about (the actor), if any.
    pub team: Option<Team>,
    pub objective: Option<ObjectiveId>,
    /// Text key of the objective, copied from topology.
    pub key: Option<String>,
}

impl Broadcast {
    pub fn match_wide(notice: Notice) -> Self {
        Self {
            notice,
            team: None,
            objective: None,
            key: None,
        }
    }
}

/// Honor/reputation payout decision. The world layer applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGrant {
    pub team: Team,
    pub honor: u32,
    pub reputation: u32,
    pub reason: RewardReason,
}

/// Spawn/despawn request for the world objects backing an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnRequest {
    pub objective: ObjectiveId,
    /// State whose visuals (banner, flag, rubble) should now be present.
    pub state: ObjectiveState,
    /// For graveyards: players bound to this team's resurrection point must
    /// be relocated.
    pub relocate: Option<Team>,
}

/// A single consequence of an interaction or tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Effect {
    /// Score change requested by a transition. Applied by the scoreboard.
    ScoreDelta { team: Team, delta: i32 },
    /// Scoreboard value after a change (world-state update).
    ScoreChanged { team: Team, score: u32 },
    Reward(RewardGrant),
    Broadcast(Broadcast),
    Respawn(RespawnRequest),
    /// Objective state changed (world-state update).
    ObjectiveChanged {
        objective: ObjectiveId,
        state: ObjectiveState,
        owner: Option<Team>,
        world_state: Option<u32>,
    },
    PhaseChanged { phase: MatchPhase },
    /// Warmup ended; doors/gates of the starting area open.
    DoorsOpened,
    /// Relay maps: which team attacks this round.
    RolesAssigned { attackers: Team },
    MatchEnded { result: MatchResult },
}

impl Effect {
    /// Team credited with a capture by this effect, if it is one.
    pub fn capturing_team(&self) -> Option<Team> {
        match self {
            Effect::Broadcast(Broadcast {
                notice: Notice::Captured | Notice::FlagCaptured,
                team,
                ..
            }) => *team,
            _ => None,
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Effect::Reward(_))
    }
}
