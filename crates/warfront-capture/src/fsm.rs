//! Capture state machine.
//!
//! Routes interactions to the targeted objective and layers the
//! cross-objective rules on top of the single-objective transitions:
//! gate-chain prerequisites, paired-structure reward suppression, and
//! flag captures that involve two objectives. Operates on a plain slice
//! of objectives indexed by id; owns no match state.

use warfront_core::effects::{Broadcast, Effect, Notice, RewardGrant};
use warfront_core::enums::{ObjectiveState, RewardReason};
use warfront_core::interactions::Interaction;
use warfront_core::topology::{FlagRules, PairPolicy, PairRule, Topology};
use warfront_core::types::{ObjectiveId, Team};

use crate::objective::{Objective, Outcome, Stance};

/// Cross-objective transition engine for one map.
#[derive(Debug, Clone)]
pub struct CaptureStateMachine {
    pairs: Vec<PairRule>,
    flags: FlagRules,
}

impl CaptureStateMachine {
    pub fn new(topology: &Topology) -> Self {
        Self {
            pairs: topology.pairs.clone(),
            flags: topology.scoring.flags.clone(),
        }
    }

    /// Apply one interaction. Returns the resulting effects, empty when the
    /// interaction was stale or illegal.
    pub fn handle(&self, objectives: &mut [Objective], interaction: &Interaction) -> Vec<Effect> {
        let Some(id) = interaction.objective() else {
            return Vec::new();
        };
        if id.index() >= objectives.len() {
            tracing::warn!(
                target: "warfront::capture",
                objective = %id,
                "interaction.unknown_objective"
            );
            return Vec::new();
        }
        if !prerequisites_met(objectives, id) {
            tracing::debug!(
                target: "warfront::capture",
                objective = %id,
                "interaction.locked"
            );
            return Vec::new();
        }

        match *interaction {
            Interaction::Use { team, .. } => {
                let objective = &mut objectives[id.index()];
                match objective.interaction_for(team) {
                    Some(Stance::Assault | Stance::PickUp) => objective.assault(team),
                    Some(Stance::Defend) => objective.resolve(Outcome::Defended(team)),
                    Some(Stance::Return) => objective.resolve(Outcome::Returned { by: team }),
                    None => Vec::new(),
                }
            }
            Interaction::Assault { team, .. } => {
                let objective = &mut objectives[id.index()];
                if objective.rules().carried {
                    return Vec::new();
                }
                objective.assault(team)
            }
            Interaction::Defend { team, .. } => {
                objectives[id.index()].resolve(Outcome::Defended(team))
            }
            Interaction::Destroy { by, .. } => {
                self.with_pair_rules(objectives, id, |objective| {
                    objective.resolve(Outcome::Destroyed { by })
                })
            }
            Interaction::Capture { by, .. } => {
                let objective = &mut objectives[id.index()];
                if objective.rules().carried {
                    return Vec::new();
                }
                objective.resolve(Outcome::Captured { by })
            }
            Interaction::Occupancy { counts, .. } => {
                objectives[id.index()].set_occupancy(counts);
                Vec::new()
            }
            Interaction::PickUpFlag { team, .. } => {
                let flag = &mut objectives[id.index()];
                if !flag.rules().carried {
                    return Vec::new();
                }
                flag.assault(team)
            }
            Interaction::DropFlag { .. } => objectives[id.index()].resolve(Outcome::Dropped),
            Interaction::ReturnFlag { team, .. } => {
                objectives[id.index()].resolve(Outcome::Returned { by: team })
            }
            Interaction::CaptureFlag { flag, at, team } => {
                self.capture_flag(objectives, flag, at, team)
            }
            Interaction::Kill { .. } => Vec::new(),
        }
    }

    /// Advance every objective's timers and capture bars.
    pub fn advance(&self, objectives: &mut [Objective], delta_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        for index in 0..objectives.len() {
            let id = objectives[index].id();
            let produced = self.with_pair_rules(objectives, id, |objective| {
                let mut produced = objective.advance(delta_ms);
                produced.extend(objective.advance_progress(delta_ms));
                produced
            });
            effects.extend(produced);
        }
        effects
    }

    /// Points a flag capture is worth to `team` right now.
    pub fn flag_capture_points(&self, objectives: &[Objective], team: Team) -> u32 {
        let held = objectives
            .iter()
            .filter(|o| !o.rules().carried && o.controller() == Some(team))
            .count();
        let table = &self.flags.capture_points;
        table
            .get(held)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(0)
    }

    fn capture_flag(
        &self,
        objectives: &mut [Objective],
        flag: ObjectiveId,
        at: ObjectiveId,
        team: Team,
    ) -> Vec<Effect> {
        let Some(point) = objectives.get(at.index()) else {
            return Vec::new();
        };
        let carried = &objectives[flag.index()];
        if !carried.rules().carried || carried.state() != ObjectiveState::Taken(team) {
            return Vec::new();
        }

        // A team flag stand only scores while the team's own flag is home.
        let at_stand = point.rules().carried;
        let allowed = if at_stand {
            point.home() == Some(team) && point.state() == ObjectiveState::InBase
        } else {
            point.controller() == Some(team)
        };
        if !allowed || flag == at {
            tracing::debug!(
                target: "warfront::capture",
                flag = %flag,
                at = %at,
                team = %team,
                "flag.capture_refused"
            );
            return Vec::new();
        }

        let points = self.flag_capture_points(objectives, team);
        let mut effects = objectives[flag.index()].resolve(Outcome::Captured { by: team });
        if at_stand {
            effects.extend(objectives[at.index()].begin_respawn());
        }
        if points > 0 {
            effects.push(Effect::ScoreDelta {
                team,
                delta: points as i32,
            });
        }
        let reward = self.flags.capture_reward;
        if !reward.is_empty() {
            effects.push(Effect::Reward(RewardGrant {
                team,
                honor: reward.honor,
                reputation: reward.reputation,
                reason: RewardReason::FlagCapture,
            }));
        }
        effects
    }

    /// Run a transition on `id`, then withhold honor if it destroyed a
    /// structure whose paired partner was already down. Reputation is kept.
    fn with_pair_rules(
        &self,
        objectives: &mut [Objective],
        id: ObjectiveId,
        transition: impl FnOnce(&mut Objective) -> Vec<Effect>,
    ) -> Vec<Effect> {
        let suppress = self.pairs.iter().find_map(|pair| {
            let partner = pair.partner_of(id)?;
            let partner_down = objectives
                .get(partner.index())
                .is_some_and(Objective::is_destroyed);
            match pair.policy {
                PairPolicy::SuppressRewardWhenPartnerDestroyed => Some(partner_down),
            }
        });

        let objective = &mut objectives[id.index()];
        let was_destroyed = objective.is_destroyed();
        let mut effects = transition(objective);

        if suppress == Some(true) && !was_destroyed && objective.is_destroyed() {
            let mut suppressed = false;
            effects.retain_mut(|effect| match effect {
                Effect::Reward(grant) if grant.honor > 0 => {
                    suppressed = true;
                    grant.honor = 0;
                    grant.reputation > 0
                }
                _ => true,
            });
            if suppressed {
                tracing::info!(
                    target: "warfront::capture",
                    objective = %id,
                    "pair.reward_suppressed"
                );
                effects.push(Effect::Broadcast(Broadcast {
                    notice: Notice::RewardSuppressed,
                    team: None,
                    objective: Some(id),
                    key: Some(objective.key().to_owned()),
                }));
            }
        }
        effects
    }
}

/// Every gate in front of `id` is down.
fn prerequisites_met(objectives: &[Objective], id: ObjectiveId) -> bool {
    objectives[id.index()]
        .requires_destroyed()
        .iter()
        .all(|prerequisite| {
            objectives
                .get(prerequisite.index())
                .is_some_and(Objective::is_destroyed)
        })
}
