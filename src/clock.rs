use std::time::{Duration, Instant};

/// Fixed-interval tick scheduler driven by the caller's event loop.
///
/// The clock never sleeps; the loop asks [`TickClock::due`] with the current
/// instant and uses [`TickClock::time_until_next`] as its input poll timeout.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    interval: Duration,
    last_tick: Instant,
    stopped: bool,
}

impl TickClock {
    /// Starts a clock whose first tick is due one interval after `now`.
    #[must_use]
    pub fn start(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_tick: now,
            stopped: false,
        }
    }

    /// Returns true once per elapsed interval and restarts the interval.
    pub fn due(&mut self, now: Instant) -> bool {
        if self.stopped || now.saturating_duration_since(self.last_tick) < self.interval {
            return false;
        }

        self.last_tick = now;
        true
    }

    /// Time left until the next tick, or `None` once stopped.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        if self.stopped {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.last_tick);
        Some(self.interval.saturating_sub(elapsed))
    }

    /// Stops the clock permanently.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
