//! Match scheduler: phase machine and phase clocks.
//!
//! Warmup → RoundInProgress → Ended for single-round maps. Relay maps run
//! Warmup → RoundInProgress → Intermission → Warmup → RoundTwo → Ended,
//! swapping attackers between rounds. The scheduler only keeps time and
//! announces phase boundaries; the engine decides what a boundary means
//! for objectives and scores.

use serde::{Deserialize, Serialize};

use warfront_core::clock::Clock;
use warfront_core::effects::{Broadcast, Effect, Notice};
use warfront_core::enums::MatchPhase;
use warfront_core::state::RoundView;
use warfront_core::topology::ScheduleRules;
use warfront_core::types::Team;

/// Phase boundary the engine must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Warmup ended and play began.
    RoundStarted { round: u8 },
    /// The round (relay) or match time limit ran out.
    TimeUp,
    /// Round two ran longer than a completed round one and can no longer win.
    RoundOverrun,
}

/// Result of advancing the scheduler by one slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    pub effects: Vec<Effect>,
    pub event: Option<PhaseEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScheduler {
    rules: ScheduleRules,
    phase: MatchPhase,
    clock: Clock,
    /// Warmup announcements still to fire, as ms before the doors open,
    /// largest first.
    pending_announcements: Vec<u64>,
    attackers: Option<Team>,
    round: u8,
    round_elapsed_ms: u64,
    rounds: Vec<RoundView>,
}

impl MatchScheduler {
    pub fn new(rules: &ScheduleRules, attackers: Option<Team>) -> Self {
        let mut scheduler = Self {
            rules: rules.clone(),
            phase: MatchPhase::Warmup,
            clock: Clock::default(),
            pending_announcements: Vec::new(),
            attackers,
            round: 1,
            round_elapsed_ms: 0,
            rounds: Vec::new(),
        };
        scheduler.reset(attackers);
        scheduler
    }

    /// Back to the start of warmup for round one.
    pub fn reset(&mut self, attackers: Option<Team>) {
        self.phase = MatchPhase::Warmup;
        self.attackers = attackers;
        self.round = 1;
        self.round_elapsed_ms = 0;
        self.rounds.clear();
        self.begin_warmup();
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn attackers(&self) -> Option<Team> {
        self.attackers
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    /// Live time spent in the current round.
    pub fn round_elapsed_ms(&self) -> u64 {
        self.round_elapsed_ms
    }

    /// Finished relay rounds.
    pub fn rounds(&self) -> &[RoundView] {
        &self.rounds
    }

    pub fn is_relay(&self) -> bool {
        self.rules.relay.is_some()
    }

    /// Time left in the current phase, when the phase is timed.
    pub fn phase_remaining_ms(&self) -> Option<u64> {
        self.clock.is_armed().then(|| self.clock.remaining())
    }

    /// Longest part of `budget` that crosses no phase boundary.
    pub fn slice(&self, budget: u64) -> u64 {
        let mut slice = budget;
        if self.clock.is_armed() {
            slice = slice.min(self.clock.remaining());
        }
        if let Some(at) = self.overrun_at() {
            slice = slice.min(at.saturating_sub(self.round_elapsed_ms));
        }
        slice
    }

    /// Advance the phase clock by a slice obtained from [`Self::slice`].
    pub fn advance(&mut self, slice: u64) -> SchedulerStep {
        let mut step = SchedulerStep::default();
        match self.phase {
            MatchPhase::Ended => {}
            MatchPhase::Warmup => {
                self.clock.advance(slice);
                let remaining = self.clock.remaining();
                while let Some(&next) = self.pending_announcements.first() {
                    if remaining > next {
                        break;
                    }
                    self.pending_announcements.remove(0);
                    step.effects
                        .push(Effect::Broadcast(Broadcast::match_wide(Notice::StartingIn {
                            secs: (next / 1000) as u32,
                        })));
                }
                if self.clock.elapsed() {
                    self.open_doors(&mut step);
                }
            }
            MatchPhase::Intermission => {
                self.clock.advance(slice);
                if self.clock.elapsed() {
                    self.enter(MatchPhase::Warmup, &mut step.effects);
                    self.begin_warmup();
                }
            }
            MatchPhase::RoundInProgress | MatchPhase::RoundTwo => {
                self.round_elapsed_ms += slice;
                self.clock.advance(slice);
                if self
                    .overrun_at()
                    .is_some_and(|at| self.round_elapsed_ms >= at)
                {
                    step.event = Some(PhaseEvent::RoundOverrun);
                } else if self.clock.elapsed() {
                    self.clock.disarm();
                    step.event = Some(PhaseEvent::TimeUp);
                }
            }
        }
        step
    }

    /// Record the running relay round. After round one the teams swap
    /// roles and the match enters intermission.
    pub fn finish_round(&mut self, completed: bool) -> Vec<Effect> {
        let Some(attackers) = self.attackers else {
            return Vec::new();
        };
        if !self.phase.is_live() {
            return Vec::new();
        }
        self.rounds.push(RoundView {
            attackers,
            elapsed_ms: self.round_elapsed_ms,
            completed,
        });
        tracing::info!(
            target: "warfront::schedule",
            round = self.round,
            attackers = %attackers,
            elapsed_ms = self.round_elapsed_ms,
            completed,
            "round.finished"
        );

        let mut effects = vec![Effect::Broadcast(Broadcast::match_wide(
            Notice::RoundEnded { round: self.round },
        ))];
        if self.round == 1 {
            self.round = 2;
            self.round_elapsed_ms = 0;
            self.attackers = Some(attackers.opponent());
            self.enter(MatchPhase::Intermission, &mut effects);
            let intermission = self.rules.relay.map_or(0, |relay| relay.intermission_ms);
            self.clock.arm(intermission);
        } else {
            self.clock.disarm();
        }
        effects
    }

    /// Both relay rounds are recorded.
    pub fn rounds_complete(&self) -> bool {
        self.rounds.len() >= 2
    }

    pub fn end(&mut self) -> Vec<Effect> {
        if self.phase == MatchPhase::Ended {
            return Vec::new();
        }
        self.clock.disarm();
        self.pending_announcements.clear();
        let mut effects = Vec::new();
        self.enter(MatchPhase::Ended, &mut effects);
        effects
    }

    fn begin_warmup(&mut self) {
        let warmup = self.rules.warmup_ms;
        self.clock.arm(warmup);
        let mut pending: Vec<u64> = self
            .rules
            .announce_at_ms
            .iter()
            .copied()
            .filter(|&at| at < warmup)
            .collect();
        pending.sort_unstable_by(|a, b| b.cmp(a));
        pending.dedup();
        self.pending_announcements = pending;
    }

    fn open_doors(&mut self, step: &mut SchedulerStep) {
        let phase = if self.round == 1 {
            MatchPhase::RoundInProgress
        } else {
            MatchPhase::RoundTwo
        };
        self.enter(phase, &mut step.effects);
        self.round_elapsed_ms = 0;
        match (self.rules.relay, self.rules.time_limit_ms) {
            (Some(relay), _) => self.clock.arm(relay.round_ms),
            (None, Some(limit)) => self.clock.arm(limit),
            (None, None) => self.clock.disarm(),
        }

        step.effects.push(Effect::DoorsOpened);
        if let Some(attackers) = self.attackers {
            step.effects.push(Effect::RolesAssigned { attackers });
        }
        step.effects
            .push(Effect::Broadcast(Broadcast::match_wide(Notice::BattleBegun)));
        step.event = Some(PhaseEvent::RoundStarted { round: self.round });
    }

    fn enter(&mut self, phase: MatchPhase, effects: &mut Vec<Effect>) {
        tracing::info!(
            target: "warfront::schedule",
            from = ?self.phase,
            to = ?phase,
            round = self.round,
            "phase.changed"
        );
        self.phase = phase;
        effects.push(Effect::PhaseChanged { phase });
    }

    /// Round-two elapsed time at which round one can no longer be beaten.
    fn overrun_at(&self) -> Option<u64> {
        if self.phase != MatchPhase::RoundTwo {
            return None;
        }
        let first = self.rounds.first().filter(|round| round.completed)?;
        Some(first.elapsed_ms + 1)
    }
}
