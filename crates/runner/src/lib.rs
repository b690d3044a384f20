//! Stress Runner - concurrent fault-injection harness
//!
//! Runs one worker per synthetic agent. Every attempt picks a task, waits a
//! random delay and draws SUCCESS, FAILURE or MISSING_DATA:
//!
//! - **Outcome Model**: banded uniform draw, seedable per worker
//! - **Agent Worker**: sequential attempt loop, honors stop requests
//! - **Controller**: lifecycle, deadline, budget and best-effort join
//! - **Artifacts**: memory snapshot, statistics and audit log files
//!
//! ## Architecture
//!
//! ```text
//!               ┌──────────────────────────┐
//!               │   SimulationController   │
//!               │ (deadline / stop signal) │
//!               └────────────┬─────────────┘
//!                            │ spawn + join
//!        ┌───────────────────┼───────────────────┐
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ AgentWorker │     │ AgentWorker │ ... │ AgentWorker │
//! └──────┬──────┘     └──────┬──────┘     └──────┬──────┘
//!        │ record            │ record            │ record
//!        └───────────────────┼───────────────────┘
//!                            ▼
//!               ┌──────────────────────────┐
//!               │        EventSink         │
//!               └────────────┬─────────────┘
//!                            │ finalize
//!                            ▼
//!               ┌──────────────────────────┐
//!               │      ArtifactWriter      │
//!               └──────────────────────────┘
//! ```

pub mod artifacts;
pub mod budget;
pub mod controller;
pub mod outcome_model;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use artifacts::{ArtifactError, ArtifactPaths, ArtifactWriter};
pub use budget::OperationBudget;
pub use controller::{
    ControllerState, RunReport, RunStatus, SimulationController, SimulationError,
    run_stress_test,
};
pub use outcome_model::{OutcomeModel, worker_rng, worker_seed};
pub use worker::{AgentWorker, WorkerContext, WorkerError, WorkerStop, WorkerSummary};

// Re-export the configuration and result types for convenience
pub use stress_core::{AggregateStatistics, ConfigError, OutcomeKind, SimulationConfig};
pub use stress_sink::{EventSink, RunSnapshot};
