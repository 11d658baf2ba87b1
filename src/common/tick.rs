use std::time::Duration;

/// Component driven by the periodic game timer.
///
/// The timer guarantees that ticks never overlap, so implementors can mutate
/// their own state without locking.
pub trait Tickable {
    fn on_tick(&mut self, delta: Duration);
}

/// Interval accumulator owned by one component.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    elapsed: Duration,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Adds `delta` and reports whether the interval elapsed. Several missed
    /// intervals collapse into one firing.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(delta);
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }
}
