//! Periodic systems run for every live slice of match time.
//!
//! Systems are plain functions over the match state they are handed. They
//! own no state except their own accumulators, and they return effects or
//! grants instead of applying them.

pub mod objective_timers;
pub mod resource_ticks;
pub mod snapshot;
