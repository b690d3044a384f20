mod audit;
mod outcome;
mod statistics;

pub use audit::{AuditEntry, LifecycleMarker};
pub use outcome::{OutcomeEvent, OutcomeKind};
pub use statistics::{AggregateStatistics, MemoryEntry, OutcomeCounts};
