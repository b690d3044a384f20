//! Stress Core Domain
//!
//! Pure domain types for the multi-agent stress-test harness: identities,
//! outcome events, aggregated statistics, audit records and the run
//! configuration. No async and no shared state live here.

pub mod config;
pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use config::{SimulationConfig, default_agents, default_tasks, validate_probabilities};
pub use entities::{
    AggregateStatistics, AuditEntry, LifecycleMarker, MemoryEntry, OutcomeCounts, OutcomeEvent,
    OutcomeKind,
};
pub use error::{ConfigError, ConfigResult};
pub use values::{AgentId, RunId, TaskLabel, Timestamp};
