//! Fundamental team, identifier and time types.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Engine-side team. Game factions are mapped onto this at the boundary
/// (see [`crate::enums::Faction`]) so the engine stays symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::A, Team::B];

    /// The other team.
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => f.write_str("A"),
            Team::B => f.write_str("B"),
        }
    }
}

/// A pair of values, one per team. Replaces raw `[T; 2]` arrays indexed by
/// integer team ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerTeam<T> {
    pub a: T,
    pub b: T,
}

impl<T> PerTeam<T> {
    pub const fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Same value for both teams.
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            a: value.clone(),
            b: value,
        }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::A => &mut self.a,
            Team::B => &mut self.b,
        }
    }

    /// Iterate `(team, value)` pairs in team order.
    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> {
        [(Team::A, &self.a), (Team::B, &self.b)].into_iter()
    }

    pub fn map<U>(self, mut f: impl FnMut(Team, T) -> U) -> PerTeam<U> {
        PerTeam {
            a: f(Team::A, self.a),
            b: f(Team::B, self.b),
        }
    }
}

impl<T> Index<Team> for PerTeam<T> {
    type Output = T;

    fn index(&self, team: Team) -> &T {
        self.get(team)
    }
}

impl<T> IndexMut<Team> for PerTeam<T> {
    fn index_mut(&mut self, team: Team) -> &mut T {
        self.get_mut(team)
    }
}

/// Stable identifier of an objective within a match. Equal to its index in
/// the topology table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectiveId(pub u16);

impl ObjectiveId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logical match time, advanced only by caller-supplied deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTime {
    /// Number of ticks processed since creation or the last reset.
    pub tick: u64,
    /// Total elapsed milliseconds since creation or the last reset.
    pub elapsed_ms: u64,
}

impl MatchTime {
    pub fn advance(&mut self, delta_ms: u64) {
        self.tick += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
    }
}
