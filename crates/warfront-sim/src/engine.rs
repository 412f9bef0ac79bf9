//! Match engine: one battleground match.
//!
//! `MatchEngine` owns the objective registry, scoreboard and scheduler of a
//! match, applies interactions, runs the periodic systems for each tick
//! delta, and decides the winner. Completely headless and driven only by
//! caller-supplied time, enabling deterministic testing and replay.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warfront_capture::{CaptureStateMachine, Objective};
use warfront_core::effects::{Effect, RewardGrant};
use warfront_core::enums::{MatchPhase, MatchResult, RewardReason, UnitRole};
use warfront_core::interactions::Interaction;
use warfront_core::state::MatchSnapshot;
use warfront_core::topology::{AttackerPick, RewardTable, ScoreMode, Topology, TopologyError};
use warfront_core::types::{MatchTime, ObjectiveId, PerTeam, Team};

use crate::registry::ObjectiveRegistry;
use crate::scheduler::{MatchScheduler, PhaseEvent};
use crate::scoreboard::ScoreBoard;
use crate::sink::EffectSink;
use crate::systems;
use crate::systems::resource_ticks::{ResourceGrant, ResourceTicker};
use crate::victory::{self, WinInputs};

/// Options for creating a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// RNG seed for determinism. Same seed = same match.
    pub seed: u64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// One battleground match.
pub struct MatchEngine {
    topology: Topology,
    options: MatchOptions,
    rng: ChaCha8Rng,
    time: MatchTime,
    fsm: CaptureStateMachine,
    registry: ObjectiveRegistry,
    scoreboard: ScoreBoard,
    scheduler: MatchScheduler,
    ticker: ResourceTicker,
    last_capture: Option<Team>,
    result: Option<MatchResult>,
    sink: Option<Box<dyn EffectSink + Send>>,
}

impl MatchEngine {
    /// Create a match in warmup. Fails if the topology does not validate.
    pub fn new(topology: Topology, options: MatchOptions) -> Result<Self, TopologyError> {
        topology.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
        let attackers = pick_attackers(&topology, &mut rng);
        tracing::info!(
            target: "warfront::match",
            map = %topology.map,
            seed = options.seed,
            attackers = ?attackers,
            "match.created"
        );

        Ok(Self {
            fsm: CaptureStateMachine::new(&topology),
            registry: ObjectiveRegistry::new(&topology, attackers),
            scoreboard: ScoreBoard::new(&topology.scoring, &topology.rewards),
            scheduler: MatchScheduler::new(&topology.schedule, attackers),
            ticker: ResourceTicker::new(topology.objectives.len()),
            topology,
            options,
            rng,
            time: MatchTime::default(),
            last_capture: None,
            result: None,
            sink: None,
        })
    }

    /// Route every effect produced from now on to `sink` as well.
    pub fn set_sink(&mut self, sink: Box<dyn EffectSink + Send>) {
        self.sink = Some(sink);
    }

    /// Return the match to its creation state. Replaying the same inputs
    /// afterwards reproduces the same match.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.options.seed);
        let attackers = pick_attackers(&self.topology, &mut self.rng);
        self.time = MatchTime::default();
        self.registry.reset(attackers);
        self.scoreboard.reset();
        self.scheduler.reset(attackers);
        self.ticker.reset();
        self.last_capture = None;
        self.result = None;
        tracing::info!(
            target: "warfront::match",
            map = %self.topology.map,
            "match.reset"
        );
    }

    /// Apply one interaction from the world layer.
    pub fn handle_interaction(&mut self, interaction: &Interaction) -> Vec<Effect> {
        if self.result.is_some() || !self.scheduler.phase().is_live() {
            tracing::debug!(
                target: "warfront::match",
                phase = ?self.scheduler.phase(),
                interaction = ?interaction,
                "interaction.not_live"
            );
            return Vec::new();
        }

        let mut effects = match *interaction {
            Interaction::Kill { victim, role } => self.kill(victim, role),
            _ => {
                let raw = self.fsm.handle(self.registry.as_mut_slice(), interaction);
                self.settle(raw)
            }
        };
        effects.extend(self.check_victory(false));
        self.dispatch(&effects);
        effects
    }

    /// Advance the match by `delta_ms` of logical time.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<Effect> {
        if self.result.is_some() {
            return Vec::new();
        }

        let mut effects = Vec::new();
        let mut budget = delta_ms;
        loop {
            let phase = self.scheduler.phase();
            let mut slice = self.scheduler.slice(budget);
            // Stop at the next capture window so resource ticks see the
            // new holder from the moment it took control.
            if phase.is_live() {
                if let Some(next) = self.registry.next_timer_ms().filter(|&ms| ms > 0) {
                    slice = slice.min(next);
                }
            }
            budget -= slice;

            // Clocks first, so a round finished by this slice counts it.
            let step = self.scheduler.advance(slice);
            effects.extend(step.effects);
            if phase.is_live() && slice > 0 {
                effects.extend(self.run_systems(slice));
            }
            if self.result.is_some() {
                break;
            }

            let moved = self.scheduler.phase() != phase;
            match step.event {
                Some(event) => effects.extend(self.on_phase_event(event)),
                None if budget == 0 && !moved => break,
                None => {}
            }
            if self.result.is_some() {
                break;
            }
        }

        self.time.advance(delta_ms);
        self.dispatch(&effects);
        effects
    }

    /// Winner of a match torn down before any win condition held.
    pub fn premature_winner(&self, population: PerTeam<u32>) -> Option<Team> {
        victory::premature_winner(&self.scoreboard, population)
    }

    /// End the match now, decided by [`Self::premature_winner`].
    pub fn end_early(&mut self, population: PerTeam<u32>) -> Vec<Effect> {
        if self.result.is_some() {
            return Vec::new();
        }
        let result = self
            .premature_winner(population)
            .map_or(MatchResult::Draw, MatchResult::Victory);
        let effects = self.end_match(result);
        self.dispatch(&effects);
        effects
    }

    /// Closest graveyard controlled by `team`, for resurrection.
    pub fn nearest_graveyard(&self, team: Team, position: Vec3) -> Option<ObjectiveId> {
        self.registry.nearest_graveyard(team, position)
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        systems::snapshot::build_snapshot(
            &self.topology.map,
            self.time,
            &self.scheduler,
            &self.scoreboard,
            &self.registry,
            self.last_capture,
            self.result,
        )
    }

    pub fn winner(&self) -> Option<Team> {
        self.result.and_then(MatchResult::winner)
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn phase(&self) -> MatchPhase {
        self.scheduler.phase()
    }

    pub fn time(&self) -> MatchTime {
        self.time
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scoreboard.score(team)
    }

    pub fn attackers(&self) -> Option<Team> {
        self.scheduler.attackers()
    }

    pub fn last_capture(&self) -> Option<Team> {
        self.last_capture
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.registry.get(id)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    /// Mutable scoreboard access for tests.
    #[cfg(test)]
    pub fn scoreboard_mut(&mut self) -> &mut ScoreBoard {
        &mut self.scoreboard
    }

    /// Run all live systems in order over one slice.
    fn run_systems(&mut self, delta_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();

        // 1. Resource ticks for whoever held during the slice, judged one
        // grant at a time
        let grants = self.ticker.run(&self.topology, &self.registry, delta_ms);
        for grant in grants {
            effects.extend(self.apply_grant(grant));
            effects.extend(self.check_victory(false));
            if self.result.is_some() {
                return effects;
            }
        }

        // 2. Objective timers and capture bars; holders change at slice end
        let raw = systems::objective_timers::run(&self.fsm, &mut self.registry, delta_ms);
        effects.extend(self.settle(raw));
        effects.extend(self.check_victory(false));
        effects
    }

    /// Apply score deltas and track captures in a batch of raw effects.
    fn settle(&mut self, raw: Vec<Effect>) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(raw.len());
        for effect in raw {
            if let Some(team) = effect.capturing_team() {
                self.last_capture = Some(team);
            }
            let follow = match effect {
                Effect::ScoreDelta { team, delta } => self.scoreboard.add_points(team, delta),
                _ => Vec::new(),
            };
            effects.push(effect);
            effects.extend(follow);
        }
        effects
    }

    fn apply_grant(&mut self, grant: ResourceGrant) -> Vec<Effect> {
        let mut effects = self.settle(vec![Effect::ScoreDelta {
            team: grant.team,
            delta: grant.points,
        }]);
        if let Ok(gained) = u32::try_from(grant.points) {
            effects.extend(self.scoreboard.accumulate_periodic(grant.team, gained));
        }
        effects
    }

    fn kill(&mut self, victim: Team, role: UnitRole) -> Vec<Effect> {
        let rules = self.topology.scoring.kills;
        let elimination = matches!(self.scoreboard.mode(), ScoreMode::Elimination { .. });
        tracing::debug!(
            target: "warfront::match",
            victim = %victim,
            role = ?role,
            "unit.killed"
        );

        let mut raw = Vec::new();
        let penalty = match role {
            UnitRole::Commander if rules.commander_ends_match => {
                return self.end_match(MatchResult::Victory(victim.opponent()));
            }
            UnitRole::Captain => {
                if !rules.captain_reward.is_empty() {
                    raw.push(grant(
                        victim.opponent(),
                        rules.captain_reward,
                        RewardReason::Kill,
                    ));
                }
                rules.captain_penalty
            }
            UnitRole::Player | UnitRole::Commander => rules.player_penalty,
        };
        if elimination && penalty > 0 {
            raw.insert(
                0,
                Effect::ScoreDelta {
                    team: victim,
                    delta: -(penalty as i32),
                },
            );
        }
        self.settle(raw)
    }

    fn on_phase_event(&mut self, event: PhaseEvent) -> Vec<Effect> {
        match event {
            PhaseEvent::RoundStarted { round } => {
                tracing::info!(
                    target: "warfront::match",
                    map = %self.topology.map,
                    round,
                    attackers = ?self.scheduler.attackers(),
                    "round.started"
                );
                Vec::new()
            }
            PhaseEvent::TimeUp => self.check_victory(true),
            PhaseEvent::RoundOverrun => self.finish_round(false),
        }
    }

    /// Evaluate the win condition after a mutation.
    fn check_victory(&mut self, time_up: bool) -> Vec<Effect> {
        if self.result.is_some() || !self.scheduler.phase().is_live() {
            return Vec::new();
        }
        if self.scheduler.is_relay() {
            return self.check_round(time_up);
        }

        let holds_all = self
            .topology
            .win
            .hold_all
            .and_then(|kind| self.registry.holds_all(kind));
        let inputs = WinInputs {
            scores: &self.scoreboard,
            holds_all,
            time_up,
            last_capture: self.last_capture,
        };
        match victory::evaluate_win_condition(&inputs) {
            Some(result) => self.end_match(result),
            None => Vec::new(),
        }
    }

    /// Relay maps: a round ends when the attackers hold every hold-all
    /// objective, or when its clock runs out.
    fn check_round(&mut self, time_up: bool) -> Vec<Effect> {
        let completed = match (self.topology.win.hold_all, self.scheduler.attackers()) {
            (Some(kind), Some(attackers)) => self.registry.holds_all(kind) == Some(attackers),
            _ => false,
        };
        if !completed && !time_up {
            return Vec::new();
        }
        self.finish_round(completed)
    }

    fn finish_round(&mut self, completed: bool) -> Vec<Effect> {
        if !self.scheduler.phase().is_live() {
            return Vec::new();
        }
        let mut effects = self.scheduler.finish_round(completed);
        if self.scheduler.rounds_complete() {
            let result = victory::relay_result(self.scheduler.rounds());
            effects.extend(self.end_match(result));
            return effects;
        }

        // Roles swapped: every objective starts over for the new attackers.
        self.registry.reset(self.scheduler.attackers());
        self.ticker.reset();
        effects.extend(self.registry.iter().map(Objective::changed));
        effects
    }

    fn end_match(&mut self, result: MatchResult) -> Vec<Effect> {
        if self.result.is_some() {
            return Vec::new();
        }
        self.result = Some(result);
        self.scoreboard.lock();
        tracing::info!(
            target: "warfront::match",
            map = %self.topology.map,
            result = ?result,
            scores = ?self.scoreboard.scores(),
            elapsed_ms = self.time.elapsed_ms,
            "match.ended"
        );

        let mut effects = self.scheduler.end();
        effects.push(Effect::MatchEnded { result });
        let rewards = self.topology.rewards.clone();
        match result {
            MatchResult::Victory(winner) => {
                effects.extend(reward(winner, rewards.victory, RewardReason::Victory));
                effects.extend(reward(winner.opponent(), rewards.defeat, RewardReason::Defeat));
            }
            MatchResult::Draw => {
                for team in Team::ALL {
                    effects.extend(reward(team, rewards.defeat, RewardReason::Defeat));
                }
            }
        }
        effects
    }

    fn dispatch(&mut self, effects: &[Effect]) {
        if let Some(sink) = self.sink.as_mut() {
            for effect in effects {
                sink.apply(effect);
            }
        }
    }
}

/// Relay maps choose the first attackers; other maps have no roles.
fn pick_attackers(topology: &Topology, rng: &mut ChaCha8Rng) -> Option<Team> {
    let relay = topology.schedule.relay?;
    Some(match relay.first_attackers {
        AttackerPick::TeamA => Team::A,
        AttackerPick::TeamB => Team::B,
        AttackerPick::Seeded => {
            if rng.gen_bool(0.5) {
                Team::A
            } else {
                Team::B
            }
        }
    })
}

fn grant(team: Team, table: RewardTable, reason: RewardReason) -> Effect {
    Effect::Reward(RewardGrant {
        team,
        honor: table.honor,
        reputation: table.reputation,
        reason,
    })
}

fn reward(team: Team, table: RewardTable, reason: RewardReason) -> Option<Effect> {
    (!table.is_empty()).then(|| grant(team, table, reason))
}
