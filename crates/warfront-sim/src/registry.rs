//! Objective registry: the live objectives of one match.
//!
//! Indexed by `ObjectiveId`. Answers the aggregate questions the scoring
//! and win systems ask (how many objectives a team holds, whether a team
//! holds every objective of a kind) and the world layer's resurrection
//! point lookup.

use glam::Vec3;

use warfront_capture::Objective;
use warfront_core::enums::ObjectiveKind;
use warfront_core::state::ObjectiveView;
use warfront_core::topology::Topology;
use warfront_core::types::{ObjectiveId, Team};

#[derive(Debug, Clone)]
pub struct ObjectiveRegistry {
    objectives: Vec<Objective>,
    positions: Vec<Vec3>,
}

impl ObjectiveRegistry {
    /// Build every objective of `topology` in its starting state.
    pub fn new(topology: &Topology, attackers: Option<Team>) -> Self {
        Self {
            objectives: topology
                .objectives
                .iter()
                .map(|def| Objective::new(def, &topology.scoring.flags, attackers))
                .collect(),
            positions: topology.objectives.iter().map(|def| def.position).collect(),
        }
    }

    /// Return every objective to its starting state.
    pub fn reset(&mut self, attackers: Option<Team>) {
        for objective in &mut self.objectives {
            objective.reset(attackers);
        }
    }

    pub fn get(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Objective] {
        &mut self.objectives
    }

    /// Objectives of the given kinds fully controlled by `team`.
    pub fn held_count(&self, team: Team, kinds: &[ObjectiveKind]) -> usize {
        self.objectives
            .iter()
            .filter(|o| kinds.contains(&o.kind()) && o.controller() == Some(team))
            .count()
    }

    /// The team controlling every objective of `kind`, if one does.
    pub fn holds_all(&self, kind: ObjectiveKind) -> Option<Team> {
        let mut of_kind = self.objectives.iter().filter(|o| o.kind() == kind);
        let holder = of_kind.next()?.controller()?;
        of_kind
            .all(|o| o.controller() == Some(holder))
            .then_some(holder)
    }

    /// Closest graveyard controlled by `team`.
    pub fn nearest_graveyard(&self, team: Team, position: Vec3) -> Option<ObjectiveId> {
        self.objectives
            .iter()
            .zip(&self.positions)
            .filter(|(o, _)| o.rules().graveyard && o.controller() == Some(team))
            .min_by(|(_, a), (_, b)| {
                a.distance_squared(position)
                    .total_cmp(&b.distance_squared(position))
            })
            .map(|(o, _)| o.id())
    }

    /// Time until the soonest armed objective timer runs out.
    pub fn next_timer_ms(&self) -> Option<u64> {
        self.objectives
            .iter()
            .filter(|o| o.timer().is_armed())
            .map(|o| o.timer().remaining())
            .min()
    }

    pub fn views(&self) -> Vec<ObjectiveView> {
        self.objectives.iter().map(Objective::view).collect()
    }
}
