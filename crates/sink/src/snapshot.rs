use serde::{Deserialize, Serialize};
use stress_core::{AggregateStatistics, AuditEntry, MemoryEntry, OutcomeEvent, RunId};

/// Immutable copy of everything a sink aggregated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub statistics: AggregateStatistics,
    /// Successful attempts in order of arrival at the sink
    pub memory: Vec<MemoryEntry>,
    /// Every outcome plus lifecycle markers, in order of arrival
    pub audit_log: Vec<AuditEntry>,
}

impl RunSnapshot {
    /// Outcome events of the audit log, skipping lifecycle markers
    pub fn outcome_entries(&self) -> impl Iterator<Item = &OutcomeEvent> {
        self.audit_log.iter().filter_map(|entry| match entry {
            AuditEntry::Outcome { event, .. } => Some(event),
            AuditEntry::Lifecycle { .. } => None,
        })
    }
}
