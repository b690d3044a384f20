use stress_core::Timestamp;

/// Source of event and run timestamps
///
/// Readings must never go backwards: one worker's events carry
/// non-decreasing timestamps, and a run never ends before it started.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Time elapsed since `earlier`, never negative
    fn since(&self, earlier: Timestamp) -> chrono::Duration {
        (self.now() - earlier).max(chrono::Duration::zero())
    }

    fn name(&self) -> &str {
        "Clock"
    }
}
