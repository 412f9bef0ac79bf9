//! Objective capture logic for WARFRONT.
//!
//! Implements the per-objective state machine (assault, defend, destroy,
//! flag carry) and the cross-objective rules layered on top of it (gate
//! chains, paired structures, flag captures). Pure data in, effects out;
//! nothing here performs a side effect.

pub mod fsm;
pub mod objective;
pub mod rules;

pub use fsm::CaptureStateMachine;
pub use objective::{Objective, Outcome, Stance};
pub use warfront_core as core;
