//! Countdown clock driven by logical time deltas.

use serde::{Deserialize, Serialize};

/// A countdown armed with a duration and advanced by elapsed-time deltas.
///
/// Advancing a disarmed clock is a no-op. Once elapsed the clock stays
/// elapsed until it is re-armed or disarmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    remaining_ms: u64,
    armed: bool,
}

impl Clock {
    /// A clock already armed with `duration_ms`.
    pub fn armed(duration_ms: u64) -> Self {
        let mut clock = Self::default();
        clock.arm(duration_ms);
        clock
    }

    pub fn arm(&mut self, duration_ms: u64) {
        self.remaining_ms = duration_ms;
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.remaining_ms = 0;
    }

    /// Advance by `delta_ms`. Returns `true` only on the advance that made
    /// the clock elapse.
    pub fn advance(&mut self, delta_ms: u64) -> bool {
        if !self.armed || self.remaining_ms == 0 {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(delta_ms);
        self.remaining_ms == 0
    }

    pub fn elapsed(&self) -> bool {
        self.armed && self.remaining_ms == 0
    }

    pub fn remaining(&self) -> u64 {
        if self.armed {
            self.remaining_ms
        } else {
            0
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
