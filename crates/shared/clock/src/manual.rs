use chrono::Duration;
use parking_lot::Mutex;
use stress_core::Timestamp;
use stress_ports::Clock;

/// Clock that only moves when told to
///
/// Optionally steps forward by a fixed amount on every read, which gives
/// strictly increasing, reproducible timestamps in tests.
pub struct ManualClock {
    current: Mutex<Timestamp>,
    step: Duration,
}

impl ManualClock {
    /// Frozen clock at `start`
    pub fn new(start: Timestamp) -> Self {
        Self::with_step(start, Duration::zero())
    }

    /// Clock at `start` that advances by `step` after every `now()`
    pub fn with_step(start: Timestamp, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// Advance the clock by a specified duration
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let mut current = self.current.lock();
        let now = *current;
        *current += self.step;
        now
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
