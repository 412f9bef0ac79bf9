//! Effect sinks: where the world layer receives engine effects.

use warfront_core::effects::Effect;

/// Performs effects on behalf of the engine: world-state updates,
/// broadcasts, spawns, reward application.
pub trait EffectSink {
    fn apply(&mut self, effect: &Effect);
}

/// Collects effects for later inspection.
impl EffectSink for Vec<Effect> {
    fn apply(&mut self, effect: &Effect) {
        self.push(effect.clone());
    }
}

/// Logs every effect and performs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EffectSink for TracingSink {
    fn apply(&mut self, effect: &Effect) {
        tracing::debug!(target: "warfront::effects", effect = ?effect, "effect.applied");
    }
}
