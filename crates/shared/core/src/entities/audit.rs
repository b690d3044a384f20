use crate::entities::outcome::{OutcomeEvent, OutcomeKind};
use crate::values::{AgentId, RunId, Timestamp};
use serde::{Deserialize, Serialize};

/// Run lifecycle points that are written to the audit log between outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum LifecycleMarker {
    RunStarted { agents: usize, tasks: usize },
    StopRequested { reason: String },
    WorkerFailed { agent: AgentId, error: String },
    RunFinished,
}

impl std::fmt::Display for LifecycleMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleMarker::RunStarted { agents, tasks } => {
                write!(f, "started ({agents} agents, {tasks} tasks)")
            }
            LifecycleMarker::StopRequested { reason } => write!(f, "stop requested: {reason}"),
            LifecycleMarker::WorkerFailed { agent, error } => {
                write!(f, "worker {agent} failed: {error}")
            }
            LifecycleMarker::RunFinished => f.write_str("finished"),
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEntry {
    Outcome {
        event: OutcomeEvent,
        reason: Option<String>,
    },
    Lifecycle {
        run_id: RunId,
        timestamp: Timestamp,
        marker: LifecycleMarker,
    },
}

impl AuditEntry {
    /// Audit record for a submitted event, tagged with its reason string
    pub fn outcome(event: OutcomeEvent) -> Self {
        let reason = event.reason();
        AuditEntry::Outcome { event, reason }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            AuditEntry::Outcome { event, .. } => event.timestamp,
            AuditEntry::Lifecycle { timestamp, .. } => *timestamp,
        }
    }

    /// Log severity matching the outcome
    pub fn level(&self) -> &'static str {
        match self {
            AuditEntry::Outcome { event, .. } => match event.outcome {
                OutcomeKind::Success => "INFO",
                OutcomeKind::MissingData => "WARN",
                OutcomeKind::Failure => "ERROR",
            },
            AuditEntry::Lifecycle {
                marker: LifecycleMarker::WorkerFailed { .. },
                ..
            } => "ERROR",
            AuditEntry::Lifecycle { .. } => "INFO",
        }
    }
}

/// Renders one audit log line (without the trailing newline)
impl std::fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ts = self
            .timestamp()
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        match self {
            AuditEntry::Outcome { event, reason } => {
                write!(
                    f,
                    "{ts} {level} {agent} {task} {outcome}",
                    level = self.level(),
                    agent = event.agent,
                    task = event.task,
                    outcome = event.outcome,
                )?;
                if let Some(reason) = reason {
                    write!(f, " - {reason}")?;
                }
                Ok(())
            }
            AuditEntry::Lifecycle { run_id, marker, .. } => {
                write!(f, "{ts} {} run {run_id} {marker}", self.level())
            }
        }
    }
}
