//! Simulation Controller - worker lifecycle for one run
//!
//! ```text
//! CONFIGURED ──run──► RUNNING ──all workers joined──► COMPLETED
//!                        │
//!                        └──── any worker error ────► FAILED
//! ```
//!
//! Failure is best-effort: every worker is joined before the run is
//! finalized, so statistics of healthy workers are never lost.

use crate::artifacts::{ArtifactError, ArtifactPaths, ArtifactWriter};
use crate::budget::OperationBudget;
use crate::outcome_model::{OutcomeModel, worker_rng};
use crate::worker::{AgentWorker, WorkerContext, WorkerError, WorkerStop, WorkerSummary};
use std::sync::Arc;
use stress_clock::SystemClock;
use stress_core::{
    AgentId, ConfigError, LifecycleMarker, RunId, SimulationConfig, TaskLabel,
};
use stress_ports::{Clock, SinkError};
use stress_sink::{EventSink, RunSnapshot};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Errors that prevent a run from producing statistics
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to start execution runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("simulation already started")]
    AlreadyStarted,

    #[error("event sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to write artifacts: {0}")]
    Artifact(#[from] ArtifactError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Configured,
    Running,
    Completed,
    Failed,
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    /// Frozen statistics, memory snapshot and audit log
    pub snapshot: Arc<RunSnapshot>,
    /// Summaries of workers that finished without error
    pub summaries: Vec<WorkerSummary>,
    pub worker_errors: Vec<WorkerError>,
    /// A deadline or operation budget cut the run short
    pub stopped_early: bool,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Orchestrates the workers of a single run
pub struct SimulationController {
    config: SimulationConfig,
    model: OutcomeModel,
    run_id: RunId,
    sink: Arc<EventSink>,
    clock: Arc<dyn Clock>,
    state: ControllerState,
}

impl SimulationController {
    /// Validate the configuration and prepare a run on the system clock
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Validate the configuration and prepare a run on a custom clock
    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let model = OutcomeModel::from_config(&config)?;
        let run_id = Uuid::new_v4();
        let sink = Arc::new(EventSink::new(run_id, config.agents.clone()));

        Ok(Self {
            config,
            model,
            run_id,
            sink,
            clock,
            state: ControllerState::Configured,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Shared handle to the run's sink, e.g. for progress snapshots
    pub fn sink(&self) -> Arc<EventSink> {
        self.sink.clone()
    }

    /// Run all workers to completion on the current tokio runtime
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != ControllerState::Configured {
            return Err(SimulationError::AlreadyStarted);
        }

        let start_time = self.clock.now();
        self.sink.open(start_time, self.config.tasks.len())?;
        self.state = ControllerState::Running;

        log::info!(
            "[run {}] starting {} agents x {} operations ({} tasks, missing_data_prob={}, failure_prob={})",
            self.run_id,
            self.config.agents.len(),
            self.config.operations_per_agent,
            self.config.tasks.len(),
            self.config.missing_data_prob,
            self.config.failure_prob
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let stop_tx = Arc::new(stop_tx);
        let ctx = self.worker_context();

        let handles: Vec<(AgentId, JoinHandle<_>)> = self
            .config
            .agents
            .iter()
            .enumerate()
            .map(|(index, agent)| {
                let worker = AgentWorker::new(
                    agent.clone(),
                    ctx.clone(),
                    worker_rng(self.config.seed, index),
                    stop_rx.clone(),
                );
                (agent.clone(), tokio::spawn(worker.run()))
            })
            .collect();
        drop(stop_rx);

        let deadline_timer = self.config.deadline().map(|deadline| {
            let stop_tx = stop_tx.clone();
            let sink = self.sink.clone();
            let clock = self.clock.clone();
            let run_id = self.run_id;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                log::warn!("[run {run_id}] deadline of {deadline:?} reached, stopping workers");
                let marker = LifecycleMarker::StopRequested {
                    reason: format!("deadline of {deadline:?} reached"),
                };
                if let Err(e) = sink.mark(clock.now(), marker) {
                    log::debug!("[run {run_id}] could not mark stop request: {e}");
                }
                stop_tx.send_replace(true);
            })
        });

        let (summaries, worker_errors) = self.join_workers(handles).await;

        if let Some(timer) = deadline_timer {
            timer.abort();
        }

        let snapshot = self.finalize()?;
        let stopped_early = summaries.iter().any(|s| s.stop != WorkerStop::Completed);
        let status = if worker_errors.is_empty() {
            self.state = ControllerState::Completed;
            RunStatus::Completed
        } else {
            self.state = ControllerState::Failed;
            RunStatus::Failed
        };

        let stats = &snapshot.statistics;
        log::info!(
            "[run {}] {:?} after {}ms: {} operations ({} ok, {} failed, {} missing data), {} worker errors",
            self.run_id,
            status,
            self.clock.since(start_time).num_milliseconds(),
            stats.total_operations(),
            stats.successful_operations(),
            stats.failed_operations(),
            stats.missing_data_events(),
            worker_errors.len()
        );

        Ok(RunReport {
            run_id: self.run_id,
            status,
            snapshot,
            summaries,
            worker_errors,
            stopped_early,
        })
    }

    /// Build a multi-thread runtime and run on it
    pub fn run_blocking(&mut self) -> Result<RunReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run())
    }

    fn worker_context(&self) -> WorkerContext {
        let (min_delay, max_delay) = self.config.delay_bounds();
        let tasks: Arc<[TaskLabel]> = self.config.tasks.clone().into();

        WorkerContext {
            tasks,
            model: self.model,
            operations: self.config.operations_per_agent,
            min_delay,
            max_delay,
            recorder: self.sink.clone(),
            clock: self.clock.clone(),
            budget: self
                .config
                .max_total_operations
                .map(|limit| Arc::new(OperationBudget::new(limit))),
        }
    }

    /// Wait for every worker, collecting one result per worker
    async fn join_workers(
        &self,
        handles: Vec<(AgentId, JoinHandle<std::result::Result<WorkerSummary, WorkerError>>)>,
    ) -> (Vec<WorkerSummary>, Vec<WorkerError>) {
        let mut summaries = Vec::with_capacity(handles.len());
        let mut errors = Vec::new();

        for (agent, handle) in handles {
            let error = match handle.await {
                Ok(Ok(summary)) => {
                    summaries.push(summary);
                    continue;
                }
                Ok(Err(err)) => err,
                Err(join_err) => WorkerError::Panicked {
                    agent,
                    message: join_err.to_string(),
                },
            };

            log::error!("[run {}] {}", self.run_id, error);
            let marker = LifecycleMarker::WorkerFailed {
                agent: error.agent().clone(),
                error: error.to_string(),
            };
            if let Err(e) = self.sink.mark(self.clock.now(), marker) {
                log::debug!("[run {}] could not mark worker failure: {}", self.run_id, e);
            }
            errors.push(error);
        }

        (summaries, errors)
    }

    /// Freeze the sink, or adopt its frozen state if it was closed early
    fn finalize(&self) -> Result<Arc<RunSnapshot>> {
        match self.sink.finalize(self.clock.now()) {
            Ok(snapshot) => Ok(snapshot),
            Err(SinkError::Finalized) => {
                log::warn!("[run {}] sink was finalized before all workers joined", self.run_id);
                self.sink
                    .frozen()
                    .ok_or(SimulationError::Sink(SinkError::Finalized))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Validate, run on a fresh runtime and write the artifacts
///
/// Returns the report even when the run ended in the FAILED state; the
/// artifacts then hold the partial statistics.
pub fn run_stress_test(config: SimulationConfig) -> Result<(RunReport, ArtifactPaths)> {
    let writer = ArtifactWriter::new(&config.output_dir);
    let mut controller = SimulationController::new(config)?;
    let report = controller.run_blocking()?;
    let paths = writer.write(&report.snapshot)?;

    log::info!(
        "Stress test completed. Logs and memory snapshot generated in {}.",
        writer.output_dir().display()
    );
    Ok((report, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_logs, logged};

    fn small_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_agents(["A", "B"])
            .with_tasks(["buy", "sell"])
            .with_probabilities(0.0, 0.0)
            .with_delays(0.0, 0.0)
            .with_operations(10)
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = small_config().with_agents(Vec::<String>::new());
        let result = SimulationController::new(config);

        assert!(matches!(
            result,
            Err(SimulationError::Config(ConfigError::EmptyAgents))
        ));
    }

    #[test]
    fn test_new_controller_is_configured() {
        let controller = SimulationController::new(small_config()).unwrap();

        assert_eq!(controller.state(), ControllerState::Configured);
        assert!(controller.sink().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_run_completes() {
        let mut controller = SimulationController::new(small_config()).unwrap();
        let report = controller.run().await.unwrap();

        assert_eq!(controller.state(), ControllerState::Completed);
        assert!(report.is_completed());
        assert!(!report.stopped_early);
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.snapshot.statistics.total_operations(), 20);
    }

    #[tokio::test]
    async fn test_run_twice_rejected() {
        let mut controller = SimulationController::new(small_config()).unwrap();
        controller.run().await.unwrap();

        assert!(matches!(
            controller.run().await,
            Err(SimulationError::AlreadyStarted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_after_external_finalize() {
        capture_logs();
        let config = SimulationConfig {
            deadline_secs: Some(0.5),
            ..small_config().with_delays(1.0, 1.0).with_operations(100)
        };
        let mut controller = SimulationController::new(config).unwrap();
        let run_id = controller.run_id();
        let sink = controller.sink();

        let handle = tokio::spawn(async move {
            let report = controller.run().await;
            (controller, report)
        });

        // Workers are still in their first delay when the sink is closed
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        sink.finalize(chrono::Utc::now()).unwrap();

        let (controller, report) = handle.await.unwrap();
        let report = report.unwrap();

        assert_eq!(controller.state(), ControllerState::Completed);
        assert!(report.stopped_early);
        assert_eq!(report.snapshot.statistics.total_operations(), 0);
        assert_eq!(
            logged(&format!("[run {run_id}] could not mark stop request")).len(),
            1
        );
    }

    #[test]
    fn test_run_blocking_builds_runtime() {
        let mut controller = SimulationController::new(small_config()).unwrap();
        let report = controller.run_blocking().unwrap();

        assert_eq!(report.snapshot.statistics.successful_operations(), 20);
        assert_eq!(report.snapshot.memory.len(), 20);
    }
}
