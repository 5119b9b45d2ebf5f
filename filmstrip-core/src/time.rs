//! Monotonic time source used to drive animations.
//!
//! Animation progress is computed against an external clock so tests can
//! substitute a manually advanced one and step the kernel deterministically.

use std::time::Instant;

/// Monotonic millisecond clock consumed by the kernel.
///
/// `now_ms` is read once per advance tick; `start_time_ms` stamps the epoch
/// of a newly started animation and must be comparable with (and never run
/// ahead of values later returned by) `now_ms`.
pub trait AnimationClock {
    /// Current time in milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Timestamp for an animation that starts now.
    fn start_time_ms(&mut self) -> u64 {
        self.now_ms()
    }
}

/// Default wall-clock implementation backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of creation.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
