use stress_core::OutcomeEvent;

use crate::error::SinkResult;

/// Port through which workers submit outcome events
///
/// Implementations must apply each accepted event exactly once and must be
/// safe to call from many workers at the same time. Submission moves the
/// event into the recorder.
pub trait EventRecorder: Send + Sync {
    /// Record one event, or reject it if the recorder no longer accepts events
    fn record(&self, event: OutcomeEvent) -> SinkResult<()>;
}
