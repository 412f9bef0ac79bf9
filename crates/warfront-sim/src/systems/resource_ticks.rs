//! Resource tick system: periodic score from held objectives.
//!
//! Two sources: the map-level tick table, where the number of counted
//! objectives a team controls picks the interval and payout, and
//! per-objective yields paid while a single objective stays controlled
//! (mines). Accumulated time carries across slices so arbitrary delta
//! sizes produce the same ticks.

use serde::{Deserialize, Serialize};

use warfront_core::topology::{Topology, YieldTarget};
use warfront_core::types::{PerTeam, Team};

use crate::registry::ObjectiveRegistry;

/// Resources earned (or drained, when negative) by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGrant {
    pub team: Team,
    pub points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTicker {
    /// Time since each team's last map-level tick.
    team_elapsed: PerTeam<u64>,
    /// Time each yielding objective has been held by its current controller.
    yield_elapsed: Vec<u64>,
    yield_holders: Vec<Option<Team>>,
}

impl ResourceTicker {
    pub fn new(objective_count: usize) -> Self {
        Self {
            team_elapsed: PerTeam::default(),
            yield_elapsed: vec![0; objective_count],
            yield_holders: vec![None; objective_count],
        }
    }

    pub fn reset(&mut self) {
        self.team_elapsed = PerTeam::default();
        self.yield_elapsed.fill(0);
        self.yield_holders.fill(None);
    }

    pub fn run(
        &mut self,
        topology: &Topology,
        registry: &ObjectiveRegistry,
        delta_ms: u64,
    ) -> Vec<ResourceGrant> {
        let mut grants = Vec::new();
        self.tick_table(topology, registry, delta_ms, &mut grants);
        self.tick_yields(topology, registry, delta_ms, &mut grants);
        grants
    }

    fn tick_table(
        &mut self,
        topology: &Topology,
        registry: &ObjectiveRegistry,
        delta_ms: u64,
        grants: &mut Vec<ResourceGrant>,
    ) {
        let Some(ticks) = &topology.scoring.resource_ticks else {
            return;
        };
        let last = ticks.intervals_ms.len().saturating_sub(1);
        for team in Team::ALL {
            let held = registry.held_count(team, &ticks.counted);
            let index = held.min(last);
            let interval = ticks.intervals_ms.get(index).copied().unwrap_or(0);
            let points = ticks.points.get(index).copied().unwrap_or(0);
            if held == 0 || interval == 0 {
                self.team_elapsed[team] = 0;
                continue;
            }

            let elapsed = &mut self.team_elapsed[team];
            *elapsed += delta_ms;
            while *elapsed >= interval {
                *elapsed -= interval;
                if points > 0 {
                    grants.push(ResourceGrant {
                        team,
                        points: points as i32,
                    });
                }
            }
        }
    }

    fn tick_yields(
        &mut self,
        topology: &Topology,
        registry: &ObjectiveRegistry,
        delta_ms: u64,
        grants: &mut Vec<ResourceGrant>,
    ) {
        for (index, def) in topology.objectives.iter().enumerate() {
            let Some(rule) = def.yields else {
                continue;
            };
            let holder = registry.get(def.id).and_then(|o| o.controller());
            if self.yield_holders[index] != holder {
                self.yield_holders[index] = holder;
                self.yield_elapsed[index] = 0;
            }
            let Some(holder) = holder else {
                continue;
            };

            let target = match rule.target {
                YieldTarget::Holder => holder,
                YieldTarget::Opponent => holder.opponent(),
            };
            let elapsed = &mut self.yield_elapsed[index];
            *elapsed += delta_ms;
            while *elapsed >= rule.interval_ms {
                *elapsed -= rule.interval_ms;
                grants.push(ResourceGrant {
                    team: target,
                    points: rule.points,
                });
            }
        }
    }
}
