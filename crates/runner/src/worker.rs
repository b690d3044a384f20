//! Agent Worker - one concurrent unit of execution per agent
//!
//! Each attempt:
//! 1. picks a task uniformly from the configured set
//! 2. sleeps a delay drawn uniformly from [min_delay, max_delay]
//! 3. draws an outcome from the outcome model
//! 4. submits the event to the recorder
//!
//! Attempts of one worker are strictly sequential. A stop request is honored
//! between attempts or during the delay; an attempt that has drawn its
//! outcome always runs through its submission.

use crate::budget::OperationBudget;
use crate::outcome_model::OutcomeModel;
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use stress_core::{AgentId, OutcomeCounts, OutcomeEvent, OutcomeKind, TaskLabel};
use stress_ports::{Clock, EventRecorder, SinkError};
use thiserror::Error;
use tokio::sync::watch;

/// Failure of a worker to complete its attempt loop
#[derive(Error, Debug, Clone)]
pub enum WorkerError {
    /// The recorder refused an event; the event is returned instead of dropped
    #[error("[{agent}] attempt {attempt} rejected by sink: {source}")]
    Rejected {
        agent: AgentId,
        attempt: u64,
        event: Box<OutcomeEvent>,
        #[source]
        source: SinkError,
    },

    #[error("[{agent}] worker task panicked: {message}")]
    Panicked { agent: AgentId, message: String },
}

impl WorkerError {
    pub fn agent(&self) -> &AgentId {
        match self {
            WorkerError::Rejected { agent, .. } | WorkerError::Panicked { agent, .. } => agent,
        }
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStop {
    /// All configured attempts were performed
    Completed,
    /// The controller asked all workers to stop
    StopRequested,
    /// The run-level operation budget ran out
    BudgetExhausted,
}

/// Result of a worker that ran without errors
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub agent: AgentId,
    /// Outcomes this worker submitted
    pub counts: OutcomeCounts,
    pub stop: WorkerStop,
}

/// Settings and collaborators shared by all workers of a run
#[derive(Clone)]
pub struct WorkerContext {
    pub tasks: Arc<[TaskLabel]>,
    pub model: OutcomeModel,
    pub operations: u64,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub recorder: Arc<dyn EventRecorder>,
    pub clock: Arc<dyn Clock>,
    pub budget: Option<Arc<OperationBudget>>,
}

/// Worker bound to one agent identity
pub struct AgentWorker {
    agent: AgentId,
    ctx: WorkerContext,
    rng: StdRng,
    stop_rx: watch::Receiver<bool>,
}

impl AgentWorker {
    pub fn new(
        agent: AgentId,
        ctx: WorkerContext,
        rng: StdRng,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            agent,
            ctx,
            rng,
            stop_rx,
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    fn pick_task(&mut self) -> TaskLabel {
        let index = self.rng.gen_range(0..self.ctx.tasks.len());
        self.ctx.tasks[index].clone()
    }

    fn pick_delay(&mut self) -> Duration {
        let (min, max) = (self.ctx.min_delay, self.ctx.max_delay);
        if max <= min {
            return min;
        }
        let secs = self.rng.gen_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs).clamp(min, max)
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Sleep for `delay`; `false` if a stop request arrived first
    async fn pause(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return !self.stop_requested();
        }

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        let interrupted = tokio::select! {
            _ = &mut sleep => false,
            stopped = wait_for_stop(&mut self.stop_rx) => stopped,
        };
        if interrupted {
            return false;
        }

        // Either the delay elapsed or the stop channel closed without a stop
        sleep.await;
        true
    }

    fn log_outcome(&self, event: &OutcomeEvent) {
        match event.outcome {
            OutcomeKind::Success => log::debug!(
                "[{}] successfully completed {}",
                self.agent,
                event.task
            ),
            OutcomeKind::MissingData => log::warn!(
                "[{}] encountered missing data during {} task",
                self.agent,
                event.task
            ),
            OutcomeKind::Failure => {
                log::error!("[{}] failed to complete {} task", self.agent, event.task)
            }
        }
    }

    /// Run all attempts
    pub async fn run(mut self) -> Result<WorkerSummary, WorkerError> {
        log::info!(
            "[{}] Worker started ({} operations)",
            self.agent,
            self.ctx.operations
        );

        let mut counts = OutcomeCounts::default();
        let mut stop = WorkerStop::Completed;

        for attempt in 1..=self.ctx.operations {
            if self.stop_requested() {
                stop = WorkerStop::StopRequested;
                break;
            }
            if let Some(budget) = &self.ctx.budget {
                if !budget.try_reserve() {
                    stop = WorkerStop::BudgetExhausted;
                    break;
                }
            }

            let task = self.pick_task();
            let delay = self.pick_delay();
            if !self.pause(delay).await {
                stop = WorkerStop::StopRequested;
                break;
            }

            let outcome = self.ctx.model.draw(&mut self.rng);
            let event = OutcomeEvent::new(self.agent.clone(), task, outcome, self.ctx.clock.now());

            if let Err(source) = self.ctx.recorder.record(event.clone()) {
                log::error!(
                    "[{}] attempt {} rejected by sink: {}",
                    self.agent,
                    attempt,
                    source
                );
                return Err(WorkerError::Rejected {
                    agent: self.agent,
                    attempt,
                    event: Box::new(event),
                    source,
                });
            }
            self.log_outcome(&event);
            counts.apply(outcome);
        }

        log::info!(
            "[{}] Worker stopped ({:?}): {} operations, {} ok, {} failed, {} missing data",
            self.agent,
            stop,
            counts.total_operations,
            counts.successful_operations,
            counts.failed_operations,
            counts.missing_data_events
        );

        Ok(WorkerSummary {
            agent: self.agent,
            counts,
            stop,
        })
    }
}

/// Resolves `true` once a stop is signalled, `false` if the sender is gone
async fn wait_for_stop(rx: &mut watch::Receiver<bool>) -> bool {
    loop {
        if *rx.borrow_and_update() {
            return true;
        }
        if rx.changed().await.is_err() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome_model::worker_rng;
    use crate::test_support::{capture_logs, logged};
    use parking_lot::Mutex;
    use stress_clock::SystemClock;
    use stress_ports::SinkResult;

    /// Recorder that keeps events and can start rejecting after N of them
    struct TestRecorder {
        events: Mutex<Vec<OutcomeEvent>>,
        accept: usize,
    }

    impl TestRecorder {
        fn accepting(accept: usize) -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                accept,
            })
        }
    }

    impl EventRecorder for TestRecorder {
        fn record(&self, event: OutcomeEvent) -> SinkResult<()> {
            let mut events = self.events.lock();
            if events.len() >= self.accept {
                return Err(SinkError::Finalized);
            }
            events.push(event);
            Ok(())
        }
    }

    fn context(recorder: Arc<dyn EventRecorder>, operations: u64, delay_ms: u64) -> WorkerContext {
        WorkerContext {
            tasks: vec![TaskLabel::new("buy"), TaskLabel::new("sell")].into(),
            model: OutcomeModel::new(0.2, 0.1).unwrap(),
            operations,
            min_delay: Duration::from_millis(delay_ms),
            max_delay: Duration::from_millis(delay_ms * 2),
            recorder,
            clock: Arc::new(SystemClock::new()),
            budget: None,
        }
    }

    #[tokio::test]
    async fn test_worker_performs_all_operations() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let worker = AgentWorker::new(
            "A".into(),
            context(recorder.clone(), 25, 0),
            worker_rng(Some(1), 0),
            stop_rx,
        );

        let summary = worker.run().await.unwrap();

        assert_eq!(summary.stop, WorkerStop::Completed);
        assert_eq!(summary.counts.total_operations, 25);
        assert!(summary.counts.is_consistent());

        let events = recorder.events.lock();
        assert_eq!(events.len(), 25);
        assert!(events.iter().all(|e| e.agent.as_str() == "A"));
        assert!(events.iter().all(|e| ["buy", "sell"].contains(&e.task.as_str())));
        // Sequential attempts produce non-decreasing timestamps
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_rejected_submission_is_reported_with_event() {
        let recorder = TestRecorder::accepting(3);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let worker = AgentWorker::new(
            "B".into(),
            context(recorder.clone(), 10, 0),
            worker_rng(Some(2), 0),
            stop_rx,
        );

        let err = worker.run().await.unwrap_err();
        match err {
            WorkerError::Rejected {
                agent,
                attempt,
                event,
                source,
            } => {
                assert_eq!(agent.as_str(), "B");
                assert_eq!(attempt, 4);
                assert_eq!(event.agent.as_str(), "B");
                assert_eq!(source, SinkError::Finalized);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(recorder.events.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_event_is_not_logged_as_outcome() {
        capture_logs();
        let recorder = TestRecorder::accepting(3);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut ctx = context(recorder.clone(), 10, 0);
        ctx.model = OutcomeModel::new(0.0, 1.0).unwrap();

        let worker = AgentWorker::new("Rejected_H".into(), ctx, worker_rng(Some(8), 0), stop_rx);
        assert!(worker.run().await.is_err());

        // Only the three accepted failures reach the outcome log
        assert_eq!(logged("[Rejected_H] failed to complete").len(), 3);
        assert_eq!(logged("[Rejected_H] attempt 4 rejected").len(), 1);
    }

    #[tokio::test]
    async fn test_stop_before_start_records_nothing() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send_replace(true);

        let worker = AgentWorker::new(
            "C".into(),
            context(recorder.clone(), 10, 0),
            worker_rng(Some(3), 0),
            stop_rx,
        );
        let summary = worker.run().await.unwrap();

        assert_eq!(summary.stop, WorkerStop::StopRequested);
        assert_eq!(summary.counts.total_operations, 0);
        assert!(recorder.events.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_delay() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = AgentWorker::new(
            "D".into(),
            context(recorder.clone(), 1000, 100),
            worker_rng(Some(4), 0),
            stop_rx,
        );

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(1050)).await;
        stop_tx.send_replace(true);

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.stop, WorkerStop::StopRequested);
        // Delays are 100-200ms, so 1050ms allows between 5 and 10 attempts
        let done = summary.counts.total_operations;
        assert!((5..=10).contains(&done), "unexpected attempt count {done}");
        assert_eq!(recorder.events.lock().len() as u64, done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_stop_sender_does_not_stop_worker() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (stop_tx, stop_rx) = watch::channel(false);
        drop(stop_tx);

        let worker = AgentWorker::new(
            "E".into(),
            context(recorder.clone(), 5, 10),
            worker_rng(Some(5), 0),
            stop_rx,
        );
        let summary = worker.run().await.unwrap();

        assert_eq!(summary.stop, WorkerStop::Completed);
        assert_eq!(summary.counts.total_operations, 5);
    }

    #[tokio::test]
    async fn test_budget_limits_attempts() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut ctx = context(recorder.clone(), 50, 0);
        ctx.budget = Some(Arc::new(OperationBudget::new(7)));

        let worker = AgentWorker::new("F".into(), ctx, worker_rng(Some(6), 0), stop_rx);
        let summary = worker.run().await.unwrap();

        assert_eq!(summary.stop, WorkerStop::BudgetExhausted);
        assert_eq!(summary.counts.total_operations, 7);
    }

    #[test]
    fn test_delay_within_bounds() {
        let recorder = TestRecorder::accepting(usize::MAX);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut worker = AgentWorker::new(
            "G".into(),
            context(recorder, 1, 50),
            worker_rng(Some(7), 0),
            stop_rx,
        );

        for _ in 0..500 {
            let delay = worker.pick_delay();
            assert!(delay >= Duration::from_millis(50) && delay <= Duration::from_millis(100));
        }
    }
}
