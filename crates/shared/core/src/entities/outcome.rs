use crate::values::{AgentId, TaskLabel, Timestamp};
use serde::{Deserialize, Serialize};

/// Classification of a single task attempt
///
/// `Failure` and `MissingData` are simulated domain outcomes, not errors of
/// the harness itself. They are recorded exactly like `Success` and only
/// tallied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
    MissingData,
}

impl OutcomeKind {
    /// Wire/log name of the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::Failure => "FAILURE",
            OutcomeKind::MissingData => "MISSING_DATA",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Success)
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task attempt by one agent
///
/// Created exactly once per attempt by the worker that performed it, then
/// moved into the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub agent: AgentId,
    pub task: TaskLabel,
    pub outcome: OutcomeKind,
    pub timestamp: Timestamp,
}

impl OutcomeEvent {
    pub fn new(agent: AgentId, task: TaskLabel, outcome: OutcomeKind, timestamp: Timestamp) -> Self {
        Self {
            agent,
            task,
            outcome,
            timestamp,
        }
    }

    /// Human-readable reason for a non-success outcome
    pub fn reason(&self) -> Option<String> {
        match self.outcome {
            OutcomeKind::Success => None,
            OutcomeKind::Failure => Some(format!("failed to complete {} task", self.task)),
            OutcomeKind::MissingData => {
                Some(format!("encountered missing data during {} task", self.task))
            }
        }
    }
}
