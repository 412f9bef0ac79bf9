//! Objective timer system: expires assault, drop and respawn windows and
//! moves progress capture bars.

use warfront_capture::CaptureStateMachine;
use warfront_core::effects::Effect;

use crate::registry::ObjectiveRegistry;

pub fn run(fsm: &CaptureStateMachine, registry: &mut ObjectiveRegistry, delta_ms: u64) -> Vec<Effect> {
    if delta_ms == 0 {
        return Vec::new();
    }
    fsm.advance(registry.as_mut_slice(), delta_ms)
}
