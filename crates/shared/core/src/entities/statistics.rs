use crate::entities::outcome::{OutcomeEvent, OutcomeKind};
use crate::values::{AgentId, TaskLabel, Timestamp};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome counters, used both for run totals and per-agent breakdowns
///
/// `total_operations` always equals the sum of the three outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub missing_data_events: u64,
}

impl OutcomeCounts {
    /// Count one outcome
    pub fn apply(&mut self, outcome: OutcomeKind) {
        self.total_operations += 1;
        match outcome {
            OutcomeKind::Success => self.successful_operations += 1,
            OutcomeKind::Failure => self.failed_operations += 1,
            OutcomeKind::MissingData => self.missing_data_events += 1,
        }
    }

    /// Whether the total matches the sum of the outcome counters
    pub fn is_consistent(&self) -> bool {
        self.total_operations
            == self.successful_operations + self.failed_operations + self.missing_data_events
    }

    /// Combine two sets of counters
    pub fn merged(&self, other: &OutcomeCounts) -> OutcomeCounts {
        OutcomeCounts {
            total_operations: self.total_operations + other.total_operations,
            successful_operations: self.successful_operations + other.successful_operations,
            failed_operations: self.failed_operations + other.failed_operations,
            missing_data_events: self.missing_data_events + other.missing_data_events,
        }
    }
}

/// Aggregated statistics of one run
///
/// Serializes to the statistics document: the four total counters at top
/// level, then `start_time`, `end_time` and `agent_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    #[serde(flatten)]
    pub totals: OutcomeCounts,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    /// Per-agent breakdown, in configured agent order
    pub agent_stats: IndexMap<AgentId, OutcomeCounts>,
}

impl AggregateStatistics {
    /// Create empty statistics with a zeroed entry for every agent
    pub fn new<'a>(agents: impl IntoIterator<Item = &'a AgentId>, start_time: Timestamp) -> Self {
        let agent_stats = agents
            .into_iter()
            .map(|agent| (agent.clone(), OutcomeCounts::default()))
            .collect();

        Self {
            totals: OutcomeCounts::default(),
            start_time,
            end_time: None,
            agent_stats,
        }
    }

    /// Apply one event to the totals and to its agent's entry
    pub fn apply(&mut self, event: &OutcomeEvent) {
        self.totals.apply(event.outcome);
        self.agent_stats
            .entry(event.agent.clone())
            .or_default()
            .apply(event.outcome);
    }

    pub fn total_operations(&self) -> u64 {
        self.totals.total_operations
    }

    pub fn successful_operations(&self) -> u64 {
        self.totals.successful_operations
    }

    pub fn failed_operations(&self) -> u64 {
        self.totals.failed_operations
    }

    pub fn missing_data_events(&self) -> u64 {
        self.totals.missing_data_events
    }

    /// Counters for one agent
    pub fn agent(&self, agent: &AgentId) -> Option<&OutcomeCounts> {
        self.agent_stats.get(agent)
    }

    /// Sum of all per-agent counters
    pub fn per_agent_sum(&self) -> OutcomeCounts {
        self.agent_stats
            .values()
            .fold(OutcomeCounts::default(), |acc, counts| acc.merged(counts))
    }

    /// Check both aggregation invariants: totals add up, and the per-agent
    /// breakdown sums to the totals.
    pub fn is_consistent(&self) -> bool {
        self.totals.is_consistent()
            && self.agent_stats.values().all(OutcomeCounts::is_consistent)
            && self.per_agent_sum() == self.totals
    }
}

/// One entry of the memory snapshot (successful attempts only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub agent: AgentId,
    pub task: TaskLabel,
    pub timestamp: Timestamp,
}

impl From<&OutcomeEvent> for MemoryEntry {
    fn from(event: &OutcomeEvent) -> Self {
        Self {
            agent: event.agent.clone(),
            task: event.task.clone(),
            timestamp: event.timestamp,
        }
    }
}
