//! Enumeration types used throughout the engine.

use serde::{Deserialize, Serialize};

use crate::types::Team;

/// Game-side faction. Only used at the boundary with the world layer;
/// the engine itself works with [`Team`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Alliance,
    Horde,
}

impl From<Faction> for Team {
    fn from(faction: Faction) -> Self {
        match faction {
            Faction::Alliance => Team::A,
            Faction::Horde => Team::B,
        }
    }
}

impl From<Team> for Faction {
    fn from(team: Team) -> Self {
        match team {
            Team::A => Faction::Alliance,
            Team::B => Faction::Horde,
        }
    }
}

/// What sort of capturable entity an objective is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Graveyard or base node; becomes Controlled after an assault window.
    Grave,
    /// Tower or bunker; an undefended enemy assault destroys it.
    Tower,
    /// Carried flag with a home stand.
    Flag,
    /// Mine, captured outright by a scripted event.
    Mine,
    /// Destructible gate, never assaulted.
    Gate,
    /// Relic or titan point, captured outright by the attacking team.
    RelicPoint,
}

impl ObjectiveKind {
    pub fn is_structure(self) -> bool {
        matches!(self, ObjectiveKind::Tower | ObjectiveKind::Gate)
    }
}

/// Current state of an objective.
///
/// Node kinds use `Neutral`, `Assaulted`, `Controlled` and `Destroyed`.
/// Flags cycle through `InBase`, `Taken`, `Dropped` and `Respawning`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "team", rename_all = "snake_case")]
pub enum ObjectiveState {
    #[default]
    Neutral,
    /// Contested by the given team; capture timer running.
    Assaulted(Team),
    Controlled(Team),
    /// Terminal for structures.
    Destroyed,
    InBase,
    /// Carried by a member of the given team.
    Taken(Team),
    Dropped,
    Respawning,
}

impl ObjectiveState {
    /// Team holding the objective fully, if any.
    pub fn controller(self) -> Option<Team> {
        match self {
            ObjectiveState::Controlled(team) => Some(team),
            _ => None,
        }
    }

    pub fn is_contested(self) -> bool {
        matches!(self, ObjectiveState::Assaulted(_))
    }

    pub fn is_flag_state(self) -> bool {
        matches!(
            self,
            ObjectiveState::InBase
                | ObjectiveState::Taken(_)
                | ObjectiveState::Dropped
                | ObjectiveState::Respawning
        )
    }
}

/// How a timed or progress objective changes hands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Assault opens a capture window; expiry grants control.
    #[default]
    Timed,
    /// A capture bar driven by relative occupancy counts.
    Progress,
}

/// Match phase (top-level state of a match).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Doors closed, opening announcements counting down.
    #[default]
    Warmup,
    RoundInProgress,
    /// Between the two rounds of a relay map.
    Intermission,
    RoundTwo,
    Ended,
}

impl MatchPhase {
    /// Whether interactions and periodic ticks are live.
    pub fn is_live(self) -> bool {
        matches!(self, MatchPhase::RoundInProgress | MatchPhase::RoundTwo)
    }
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "team", rename_all = "snake_case")]
pub enum MatchResult {
    Victory(Team),
    Draw,
}

impl MatchResult {
    pub fn winner(self) -> Option<Team> {
        match self {
            MatchResult::Victory(team) => Some(team),
            MatchResult::Draw => None,
        }
    }
}

/// Role of a killed unit, used for elimination penalties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    #[default]
    Player,
    /// Named lieutenant (AV captains).
    Captain,
    /// Faction leader; killing it may end the match outright.
    Commander,
}

/// Why a reward was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardReason {
    Capture,
    Destruction,
    FlagCapture,
    /// Batched payout from accumulated resources.
    Periodic,
    Victory,
    Defeat,
    Kill,
}
