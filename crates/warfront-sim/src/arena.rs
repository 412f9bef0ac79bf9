//! Arena: many independent matches behind opaque handles.
//!
//! A single owner drives every match in the arena; matches share nothing
//! and are torn down by handle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use warfront_core::effects::Effect;
use warfront_core::interactions::Interaction;
use warfront_core::state::MatchSnapshot;
use warfront_core::topology::{Topology, TopologyError};
use warfront_core::types::{PerTeam, Team};

use crate::engine::{MatchEngine, MatchOptions};

/// Opaque identifier of a match in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchHandle(u64);

impl fmt::Display for MatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("no match with handle {0}")]
    UnknownMatch(MatchHandle),
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),
}

/// Owner of every running match.
#[derive(Default)]
pub struct Arena {
    matches: BTreeMap<MatchHandle, MatchEngine>,
    next_handle: u64,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a match with default options.
    pub fn create_match(&mut self, topology: Topology) -> Result<MatchHandle, ArenaError> {
        self.create_match_with(topology, MatchOptions::default())
    }

    pub fn create_match_with(
        &mut self,
        topology: Topology,
        options: MatchOptions,
    ) -> Result<MatchHandle, ArenaError> {
        let engine = MatchEngine::new(topology, options)?;
        let handle = MatchHandle(self.next_handle);
        self.next_handle += 1;
        tracing::info!(
            target: "warfront::arena",
            handle = %handle,
            map = %engine.topology().map,
            "arena.match_created"
        );
        self.matches.insert(handle, engine);
        Ok(handle)
    }

    pub fn handle_interaction(
        &mut self,
        handle: MatchHandle,
        interaction: &Interaction,
    ) -> Result<Vec<Effect>, ArenaError> {
        Ok(self.engine_mut(handle)?.handle_interaction(interaction))
    }

    pub fn tick(&mut self, handle: MatchHandle, delta_ms: u64) -> Result<Vec<Effect>, ArenaError> {
        Ok(self.engine_mut(handle)?.tick(delta_ms))
    }

    /// Advance every match by the same delta.
    pub fn tick_all(&mut self, delta_ms: u64) -> Vec<(MatchHandle, Vec<Effect>)> {
        self.matches
            .iter_mut()
            .map(|(&handle, engine)| (handle, engine.tick(delta_ms)))
            .filter(|(_, effects)| !effects.is_empty())
            .collect()
    }

    pub fn winner(&self, handle: MatchHandle) -> Result<Option<Team>, ArenaError> {
        Ok(self.engine(handle)?.winner())
    }

    pub fn premature_winner(
        &self,
        handle: MatchHandle,
        population: PerTeam<u32>,
    ) -> Result<Option<Team>, ArenaError> {
        Ok(self.engine(handle)?.premature_winner(population))
    }

    pub fn reset(&mut self, handle: MatchHandle) -> Result<(), ArenaError> {
        self.engine_mut(handle)?.reset();
        Ok(())
    }

    pub fn snapshot(&self, handle: MatchHandle) -> Result<MatchSnapshot, ArenaError> {
        Ok(self.engine(handle)?.snapshot())
    }

    /// Tear a match down, returning its engine.
    pub fn remove(&mut self, handle: MatchHandle) -> Result<MatchEngine, ArenaError> {
        let engine = self
            .matches
            .remove(&handle)
            .ok_or(ArenaError::UnknownMatch(handle))?;
        tracing::info!(
            target: "warfront::arena",
            handle = %handle,
            result = ?engine.result(),
            "arena.match_removed"
        );
        Ok(engine)
    }

    pub fn engine(&self, handle: MatchHandle) -> Result<&MatchEngine, ArenaError> {
        self.matches
            .get(&handle)
            .ok_or(ArenaError::UnknownMatch(handle))
    }

    pub fn engine_mut(&mut self, handle: MatchHandle) -> Result<&mut MatchEngine, ArenaError> {
        self.matches
            .get_mut(&handle)
            .ok_or(ArenaError::UnknownMatch(handle))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
