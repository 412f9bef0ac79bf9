//! A single capturable objective and its transitions.
//!
//! Stale interactions (a racing client assaulting an objective its team
//! already owns, defending one it never held) are no-ops that return no
//! effects. Nothing here is an error.

use warfront_core::clock::Clock;
use warfront_core::constants::*;
use warfront_core::effects::{Broadcast, Effect, Notice, RespawnRequest, RewardGrant};
use warfront_core::enums::*;
use warfront_core::state::ObjectiveView;
use warfront_core::topology::{FlagRules, Holder, ObjectiveDef, RewardTable};
use warfront_core::types::{ObjectiveId, PerTeam, Team};

use crate::rules::{rules_for, KindRules, TimeoutRule};

/// Resolution applied to an objective from outside an assault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The previous controller cancelled an assault.
    Defended(Team),
    /// Structure hit points reached zero.
    Destroyed { by: Team },
    /// Scripted capture, or a flag brought home.
    Captured { by: Team },
    /// The running window (assault, drop, respawn) expired.
    TimedOut,
    /// Home team touched its dropped flag.
    Returned { by: Team },
    /// The carrier lost the flag.
    Dropped,
}

/// What a plain "use" click by a team means for an objective right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Assault,
    Defend,
    PickUp,
    Return,
}

#[derive(Debug, Clone)]
pub struct Objective {
    // --- Static ---
    id: ObjectiveId,
    key: String,
    kind: ObjectiveKind,
    rules: KindRules,
    mode: CaptureMode,
    initial: Holder,
    home: Option<Team>,
    world_state: Option<u32>,
    window_ms: u64,
    drop_ms: u64,
    respawn_ms: u64,
    destroy_penalty: u32,
    reward: RewardTable,
    requires_destroyed: Vec<ObjectiveId>,

    // --- Dynamic ---
    state: ObjectiveState,
    owner: Option<Team>,
    prev_owner: Option<Team>,
    prev_state: ObjectiveState,
    last_controlling_team: Option<Team>,
    timer: Clock,
    /// Capture bar in milli-points.
    progress_milli: i64,
    occupancy: PerTeam<u32>,
}

impl Objective {
    /// Build an objective from its definition. `attackers` resolves
    /// role-relative initial holders on relay maps.
    pub fn new(def: &ObjectiveDef, flags: &FlagRules, attackers: Option<Team>) -> Self {
        let mut objective = Self {
            id: def.id,
            key: def.key.clone(),
            kind: def.kind,
            rules: rules_for(def.kind),
            mode: def.capture,
            initial: def.initial,
            home: def.home,
            world_state: def.world_state,
            window_ms: def.capture_window_ms(),
            drop_ms: flags.drop_ms,
            respawn_ms: flags.respawn_ms,
            destroy_penalty: def.destroy_penalty,
            reward: def.reward,
            requires_destroyed: def.requires_destroyed.clone(),
            state: ObjectiveState::Neutral,
            owner: None,
            prev_owner: None,
            prev_state: ObjectiveState::Neutral,
            last_controlling_team: None,
            timer: Clock::default(),
            progress_milli: 0,
            occupancy: PerTeam::default(),
        };
        objective.reset(attackers);
        objective
    }

    /// Return to the starting state of a match or round.
    pub fn reset(&mut self, attackers: Option<Team>) {
        let holder = self.initial.resolve(attackers);
        self.state = if self.rules.carried {
            ObjectiveState::InBase
        } else {
            holder.map_or(ObjectiveState::Neutral, ObjectiveState::Controlled)
        };
        self.owner = if self.rules.carried { None } else { holder };
        self.prev_owner = self.owner;
        self.prev_state = self.state;
        self.last_controlling_team = self.state.controller();
        self.timer.disarm();
        self.progress_milli = match self.state {
            ObjectiveState::Controlled(Team::A) => progress_bound(),
            ObjectiveState::Controlled(Team::B) => -progress_bound(),
            _ => 0,
        };
        self.occupancy = PerTeam::default();
    }

    // ---- Queries ----

    pub fn id(&self) -> ObjectiveId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    pub fn rules(&self) -> KindRules {
        self.rules
    }

    pub fn state(&self) -> ObjectiveState {
        self.state
    }

    pub fn owner(&self) -> Option<Team> {
        self.owner
    }

    pub fn prev_owner(&self) -> Option<Team> {
        self.prev_owner
    }

    pub fn prev_state(&self) -> ObjectiveState {
        self.prev_state
    }

    pub fn last_controlling_team(&self) -> Option<Team> {
        self.last_controlling_team
    }

    pub fn home(&self) -> Option<Team> {
        self.home
    }

    pub fn timer(&self) -> &Clock {
        &self.timer
    }

    /// Capture bar in whole points, `[-PROGRESS_LIMIT, PROGRESS_LIMIT]`.
    pub fn progress(&self) -> i32 {
        (self.progress_milli / 1000) as i32
    }

    pub fn requires_destroyed(&self) -> &[ObjectiveId] {
        &self.requires_destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ObjectiveState::Destroyed
    }

    /// Team holding the objective fully.
    pub fn controller(&self) -> Option<Team> {
        self.state.controller()
    }

    pub fn view(&self) -> ObjectiveView {
        ObjectiveView {
            id: self.id,
            key: self.key.clone(),
            kind: self.kind,
            state: self.state,
            owner: self.owner,
            prev_owner: self.prev_owner,
            prev_state: self.prev_state,
            last_controlling_team: self.last_controlling_team,
            timer_remaining_ms: self.timer.remaining(),
            progress: self.progress(),
        }
    }

    // ---- Legality ----

    /// Classify a plain click by `team`.
    pub fn interaction_for(&self, team: Team) -> Option<Stance> {
        if self.rules.carried {
            return match self.state {
                ObjectiveState::Dropped if self.home == Some(team) => Some(Stance::Return),
                _ if self.can_assault(team) => Some(Stance::PickUp),
                _ => None,
            };
        }
        if self.can_defend(team) {
            Some(Stance::Defend)
        } else if self.can_assault(team) {
            Some(Stance::Assault)
        } else {
            None
        }
    }

    pub fn can_assault(&self, team: Team) -> bool {
        if self.rules.carried {
            return matches!(self.state, ObjectiveState::InBase | ObjectiveState::Dropped)
                && self.home != Some(team);
        }
        if !self.rules.assaultable || self.mode != CaptureMode::Timed {
            return false;
        }
        if self.owner == Some(team) {
            return false;
        }
        matches!(
            self.state,
            ObjectiveState::Neutral | ObjectiveState::Controlled(_) | ObjectiveState::Assaulted(_)
        )
    }

    /// Defending requires the team to have fully held the objective right
    /// before the current assault.
    pub fn can_defend(&self, team: Team) -> bool {
        matches!(self.state, ObjectiveState::Assaulted(attacker) if attacker != team)
            && self.prev_owner == Some(team)
            && self.prev_state == ObjectiveState::Controlled(team)
    }

    // ---- Mutators ----

    /// Assert control (or pick up a flag). No-op when illegal.
    pub fn assault(&mut self, team: Team) -> Vec<Effect> {
        if !self.can_assault(team) {
            tracing::debug!(
                target: "warfront::capture",
                objective = %self.id,
                team = %team,
                state = ?self.state,
                "assault.stale"
            );
            return Vec::new();
        }

        if self.rules.carried {
            self.transition(ObjectiveState::Taken(team), Some(team));
            self.timer.disarm();
            return vec![
                self.changed(),
                self.broadcast(Notice::FlagPickedUp, Some(team)),
            ];
        }

        let relocate = self.relocation();
        self.transition(ObjectiveState::Assaulted(team), Some(team));
        self.timer.arm(self.window_ms);
        tracing::info!(
            target: "warfront::capture",
            objective = %self.id,
            team = %team,
            prev_owner = ?self.prev_owner,
            "objective.assaulted"
        );
        vec![
            self.changed(),
            self.broadcast(Notice::Assaulted, Some(team)),
            self.respawn(relocate),
        ]
    }

    /// Apply an outcome. No-op when illegal in the current state.
    pub fn resolve(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Defended(team) => self.defend(team),
            Outcome::Destroyed { by } => self.destroy(by),
            Outcome::Captured { by } => self.capture(by),
            Outcome::TimedOut => self.time_out(),
            Outcome::Returned { by } => self.return_flag(by),
            Outcome::Dropped => self.drop_flag(),
        }
    }

    /// Advance the running window, resolving every expiry the delta covers.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut budget = delta_ms;
        loop {
            if self.timer.elapsed() {
                // Every timeout either re-arms or disarms the timer.
                effects.extend(self.resolve(Outcome::TimedOut));
                continue;
            }
            if !self.timer.is_armed() || budget == 0 {
                break;
            }
            let remaining = self.timer.remaining();
            self.timer.advance(budget);
            budget = budget.saturating_sub(remaining);
        }
        effects
    }

    /// Record players standing inside a progress objective.
    pub fn set_occupancy(&mut self, counts: PerTeam<u32>) {
        self.occupancy = counts;
    }

    /// Move the capture bar of a progress objective.
    pub fn advance_progress(&mut self, delta_ms: u64) -> Vec<Effect> {
        if self.mode != CaptureMode::Progress || self.is_destroyed() {
            return Vec::new();
        }
        let advantage = i64::from(self.occupancy.a) - i64::from(self.occupancy.b);
        let cap = i64::from(PROGRESS_MAX_PLAYER_ADVANTAGE);
        let step = (advantage.clamp(-cap, cap) * i64::from(PROGRESS_POINTS_PER_PLAYER_SEC))
            .saturating_mul(i64::try_from(delta_ms).unwrap_or(i64::MAX));
        self.progress_milli = self
            .progress_milli
            .saturating_add(step)
            .clamp(-progress_bound(), progress_bound());

        let threshold = i64::from(PROGRESS_CAPTURE_THRESHOLD) * 1000;
        let leader = if self.progress_milli >= threshold {
            Some(Team::A)
        } else if self.progress_milli <= -threshold {
            Some(Team::B)
        } else {
            None
        };

        match (self.state, leader) {
            (ObjectiveState::Controlled(holder), Some(team)) if holder == team => Vec::new(),
            (_, Some(team)) => self.take_control(team),
            (ObjectiveState::Controlled(holder), None) => {
                let relocate = self.relocation();
                self.transition(ObjectiveState::Neutral, None);
                tracing::info!(
                    target: "warfront::capture",
                    objective = %self.id,
                    team = %holder,
                    "objective.neutralized"
                );
                vec![
                    self.changed(),
                    self.broadcast(Notice::Neutralized, Some(holder)),
                    self.respawn(relocate),
                ]
            }
            _ => Vec::new(),
        }
    }

    /// Send a flag sitting on its stand back through the respawn window.
    /// Used when the opposing flag is captured at this stand.
    pub fn begin_respawn(&mut self) -> Vec<Effect> {
        if !self.rules.carried || self.state != ObjectiveState::InBase {
            return Vec::new();
        }
        self.transition(ObjectiveState::Respawning, None);
        self.timer.arm(self.respawn_ms);
        vec![self.changed(), self.respawn(None)]
    }

    // ---- Transitions ----

    fn defend(&mut self, team: Team) -> Vec<Effect> {
        if self.rules.carried || !self.can_defend(team) {
            tracing::debug!(
                target: "warfront::capture",
                objective = %self.id,
                team = %team,
                prev_owner = ?self.prev_owner,
                "defend.stale"
            );
            return Vec::new();
        }
        self.transition(ObjectiveState::Controlled(team), Some(team));
        self.timer.disarm();
        tracing::info!(
            target: "warfront::capture",
            objective = %self.id,
            team = %team,
            "objective.defended"
        );
        vec![
            self.changed(),
            self.broadcast(Notice::Defended, Some(team)),
            self.respawn(None),
        ]
    }

    fn destroy(&mut self, by: Team) -> Vec<Effect> {
        if !self.rules.destructible
            || self.is_destroyed()
            || self.state == ObjectiveState::Controlled(by)
        {
            return Vec::new();
        }
        self.transition(ObjectiveState::Destroyed, None);
        self.timer.disarm();
        tracing::info!(
            target: "warfront::capture",
            objective = %self.id,
            by = %by,
            penalty = self.destroy_penalty,
            "objective.destroyed"
        );

        let mut effects = vec![
            self.changed(),
            self.broadcast(Notice::Destroyed, Some(by)),
            self.respawn(None),
        ];
        if self.destroy_penalty > 0 {
            effects.push(Effect::ScoreDelta {
                team: by.opponent(),
                delta: -(self.destroy_penalty as i32),
            });
        }
        if !self.reward.is_empty() {
            effects.push(self.reward_for(by, RewardReason::Destruction));
        }
        effects
    }

    fn capture(&mut self, by: Team) -> Vec<Effect> {
        if self.rules.carried {
            if self.state != ObjectiveState::Taken(by) {
                return Vec::new();
            }
            self.transition(ObjectiveState::Respawning, None);
            self.timer.arm(self.respawn_ms);
            tracing::info!(
                target: "warfront::capture",
                objective = %self.id,
                team = %by,
                "flag.captured"
            );
            return vec![
                self.changed(),
                self.broadcast(Notice::FlagCaptured, Some(by)),
                self.respawn(None),
            ];
        }
        if !self.rules.scripted_capture
            || self.is_destroyed()
            || self.state == ObjectiveState::Controlled(by)
        {
            return Vec::new();
        }
        self.take_control(by)
    }

    fn time_out(&mut self) -> Vec<Effect> {
        if !self.timer.elapsed() {
            return Vec::new();
        }
        let before = self.state;
        let effects = self.expire();
        if self.state == before {
            // Nothing consumed the expiry; drop it so it cannot fire again.
            self.timer.disarm();
        }
        effects
    }

    fn expire(&mut self) -> Vec<Effect> {
        match self.state {
            ObjectiveState::Assaulted(team) => match self.rules.on_timeout {
                // A structure its last holder re-assaulted goes back to that holder.
                TimeoutRule::Destroy if self.last_controlling_team == Some(team) => {
                    self.reclaim(team)
                }
                TimeoutRule::Destroy => self.destroy(team),
                TimeoutRule::Control => self.take_control(team),
            },
            ObjectiveState::Dropped => {
                self.transition(ObjectiveState::Respawning, None);
                self.timer.arm(self.respawn_ms);
                vec![
                    self.changed(),
                    self.broadcast(Notice::FlagReturned, None),
                    self.respawn(None),
                ]
            }
            ObjectiveState::Respawning => {
                self.transition(ObjectiveState::InBase, None);
                self.timer.disarm();
                vec![
                    self.changed(),
                    self.broadcast(Notice::FlagRespawned, None),
                    self.respawn(None),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn return_flag(&mut self, by: Team) -> Vec<Effect> {
        if self.state != ObjectiveState::Dropped || self.home != Some(by) {
            return Vec::new();
        }
        self.transition(ObjectiveState::InBase, None);
        self.timer.disarm();
        vec![
            self.changed(),
            self.broadcast(Notice::FlagReturned, Some(by)),
            self.respawn(None),
        ]
    }

    fn drop_flag(&mut self) -> Vec<Effect> {
        let ObjectiveState::Taken(carrier) = self.state else {
            return Vec::new();
        };
        self.transition(ObjectiveState::Dropped, None);
        self.timer.arm(self.drop_ms);
        vec![
            self.changed(),
            self.broadcast(Notice::FlagDropped, Some(carrier)),
            self.respawn(None),
        ]
    }

    /// Structure back in its holder's hands. No reward: nothing was taken.
    fn reclaim(&mut self, team: Team) -> Vec<Effect> {
        self.transition(ObjectiveState::Controlled(team), Some(team));
        self.timer.disarm();
        tracing::info!(
            target: "warfront::capture",
            objective = %self.id,
            team = %team,
            "objective.reclaimed"
        );
        vec![
            self.changed(),
            self.broadcast(Notice::Defended, Some(team)),
            self.respawn(None),
        ]
    }

    fn take_control(&mut self, team: Team) -> Vec<Effect> {
        let relocate = self.relocation();
        self.transition(ObjectiveState::Controlled(team), Some(team));
        self.timer.disarm();
        tracing::info!(
            target: "warfront::capture",
            objective = %self.id,
            team = %team,
            "objective.captured"
        );
        let mut effects = vec![
            self.changed(),
            self.broadcast(Notice::Captured, Some(team)),
            self.respawn(relocate),
        ];
        if !self.reward.is_empty() {
            effects.push(self.reward_for(team, RewardReason::Capture));
        }
        effects
    }

    /// Snapshot, then move. The only place state and owner change.
    fn transition(&mut self, state: ObjectiveState, owner: Option<Team>) {
        self.prev_owner = self.owner;
        self.prev_state = self.state;
        self.state = state;
        self.owner = owner;
        if let ObjectiveState::Controlled(team) = state {
            self.last_controlling_team = Some(team);
        }
        debug_assert!(
            self.ownership_consistent(),
            "objective {} owner {:?} inconsistent with state {:?}",
            self.id,
            self.owner,
            self.state
        );
        if !self.ownership_consistent() {
            tracing::error!(
                target: "warfront::capture",
                objective = %self.id,
                owner = ?self.owner,
                state = ?self.state,
                "objective.invariant_violated"
            );
            self.owner = owner_of(self.state);
        }
    }

    /// Ownership invariant: the owner is exactly the team named by the state.
    pub fn ownership_consistent(&self) -> bool {
        self.owner == owner_of(self.state)
    }

    // ---- Effect builders ----

    /// World-state update describing the current state.
    pub fn changed(&self) -> Effect {
        Effect::ObjectiveChanged {
            objective: self.id,
            state: self.state,
            owner: self.owner,
            world_state: self.world_state,
        }
    }

    fn broadcast(&self, notice: Notice, team: Option<Team>) -> Effect {
        Effect::Broadcast(Broadcast {
            notice,
            team,
            objective: Some(self.id),
            key: Some(self.key.clone()),
        })
    }

    fn respawn(&self, relocate: Option<Team>) -> Effect {
        Effect::Respawn(RespawnRequest {
            objective: self.id,
            state: self.state,
            relocate,
        })
    }

    fn reward_for(&self, team: Team, reason: RewardReason) -> Effect {
        Effect::Reward(RewardGrant {
            team,
            honor: self.reward.honor,
            reputation: self.reward.reputation,
            reason,
        })
    }

    /// Graveyards leaving a team's hands strand that team's dead.
    fn relocation(&self) -> Option<Team> {
        if self.rules.graveyard {
            self.state.controller()
        } else {
            None
        }
    }
}

fn owner_of(state: ObjectiveState) -> Option<Team> {
    match state {
        ObjectiveState::Assaulted(team)
        | ObjectiveState::Controlled(team)
        | ObjectiveState::Taken(team) => Some(team),
        _ => None,
    }
}

fn progress_bound() -> i64 {
    i64::from(PROGRESS_LIMIT) * 1000
}
