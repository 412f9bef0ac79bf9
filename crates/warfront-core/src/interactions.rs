//! Interaction events delivered by the world layer.
//!
//! Interactions are applied immediately by the engine. Stale or illegal
//! interactions (a racing client clicking an objective it already owns) are
//! ignored without error.

use serde::{Deserialize, Serialize};

use crate::enums::UnitRole;
use crate::types::{ObjectiveId, PerTeam, Team};

/// All possible interactions with a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Interaction {
    // --- Nodes ---
    /// A player clicked an objective. Classified into assault or defend by
    /// the objective itself.
    Use { objective: ObjectiveId, team: Team },
    /// Explicit assault on an objective.
    Assault { objective: ObjectiveId, team: Team },
    /// Explicit defense by the objective's previous controller.
    Defend { objective: ObjectiveId, team: Team },
    /// Structure hit points reached zero.
    Destroy { objective: ObjectiveId, by: Team },
    /// Scripted outright capture (mine boss killed, relic taken).
    Capture { objective: ObjectiveId, by: Team },
    /// Players of each team standing inside a progress objective's radius.
    Occupancy {
        objective: ObjectiveId,
        counts: PerTeam<u32>,
    },

    // --- Flags ---
    PickUpFlag { flag: ObjectiveId, team: Team },
    /// Carrier died or dropped the flag.
    DropFlag { flag: ObjectiveId },
    /// Home team touched its dropped flag.
    ReturnFlag { flag: ObjectiveId, team: Team },
    /// Carrier reached a capture point.
    CaptureFlag {
        flag: ObjectiveId,
        at: ObjectiveId,
        team: Team,
    },

    // --- Units ---
    /// A unit belonging to `victim` died.
    Kill { victim: Team, role: UnitRole },
}

impl Interaction {
    /// The objective this interaction targets, if any.
    pub fn objective(&self) -> Option<ObjectiveId> {
        match self {
            Interaction::Use { objective, .. }
            | Interaction::Assault { objective, .. }
            | Interaction::Defend { objective, .. }
            | Interaction::Destroy { objective, .. }
            | Interaction::Capture { objective, .. }
            | Interaction::Occupancy { objective, .. } => Some(*objective),
            Interaction::PickUpFlag { flag, .. }
            | Interaction::DropFlag { flag }
            | Interaction::ReturnFlag { flag, .. }
            | Interaction::CaptureFlag { flag, .. } => Some(*flag),
            Interaction::Kill { .. } => None,
        }
    }
}
