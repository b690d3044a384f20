//! Stress Sink
//!
//! The thread-safe aggregation point every worker reports to. Owns the run
//! statistics, the memory snapshot of successful attempts and the audit log,
//! and freezes them into a `RunSnapshot` when the run ends.

pub mod sink;
pub mod snapshot;

pub use sink::EventSink;
pub use snapshot::RunSnapshot;

// Re-export the submission port for convenience
pub use stress_ports::{EventRecorder, SinkError, SinkResult};
