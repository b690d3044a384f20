//! Event Sink - the single aggregation point of a run
//!
//! All outcome events pass through `record`. One mutex guards the totals,
//! the per-agent breakdown, the memory snapshot and the audit log, so a
//! reader never observes an event applied to one of them but not the others.
//!
//! Lifecycle: `Idle --open--> Open --finalize--> Finalized`. A finalized sink
//! rejects every further submission.

use crate::snapshot::RunSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;
use stress_core::{
    AgentId, AggregateStatistics, AuditEntry, LifecycleMarker, MemoryEntry, OutcomeEvent, RunId,
    Timestamp,
};
use stress_ports::{EventRecorder, SinkError, SinkResult};

enum SinkState {
    Idle,
    Open(OpenRun),
    Finalized(Arc<RunSnapshot>),
}

/// Mutable state of a running aggregation
struct OpenRun {
    statistics: AggregateStatistics,
    memory: Vec<MemoryEntry>,
    audit_log: Vec<AuditEntry>,
}

/// Thread-safe aggregator for one run
pub struct EventSink {
    run_id: RunId,
    agents: Vec<AgentId>,
    state: Mutex<SinkState>,
}

impl EventSink {
    /// Create an idle sink for the given agents
    pub fn new(run_id: RunId, agents: Vec<AgentId>) -> Self {
        Self {
            run_id,
            agents,
            state: Mutex::new(SinkState::Idle),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Start accepting events
    ///
    /// Creates empty statistics with a zeroed entry per configured agent and
    /// writes the `RunStarted` marker.
    pub fn open(&self, start_time: Timestamp, tasks: usize) -> SinkResult<()> {
        let mut state = self.state.lock();
        match &*state {
            SinkState::Idle => {}
            SinkState::Open(_) => return Err(SinkError::AlreadyOpen),
            SinkState::Finalized(_) => return Err(SinkError::Finalized),
        }

        let marker = AuditEntry::Lifecycle {
            run_id: self.run_id,
            timestamp: start_time,
            marker: LifecycleMarker::RunStarted {
                agents: self.agents.len(),
                tasks,
            },
        };

        *state = SinkState::Open(OpenRun {
            statistics: AggregateStatistics::new(&self.agents, start_time),
            memory: Vec::new(),
            audit_log: vec![marker],
        });

        log::debug!("[sink {}] opened for {} agents", self.run_id, self.agents.len());
        Ok(())
    }

    /// Append a lifecycle marker to the audit log
    pub fn mark(&self, timestamp: Timestamp, marker: LifecycleMarker) -> SinkResult<()> {
        let mut state = self.state.lock();
        let run = open_run(&mut state)?;
        run.audit_log.push(AuditEntry::Lifecycle {
            run_id: self.run_id,
            timestamp,
            marker,
        });
        Ok(())
    }

    /// Freeze the run and return its final snapshot
    ///
    /// `end_time` is clamped so that it is never earlier than the start time.
    /// Fails if the sink was never opened or is already finalized.
    pub fn finalize(&self, end_time: Timestamp) -> SinkResult<Arc<RunSnapshot>> {
        let mut state = self.state.lock();
        let OpenRun {
            mut statistics,
            memory,
            mut audit_log,
        } = match std::mem::replace(&mut *state, SinkState::Idle) {
            SinkState::Open(run) => run,
            other => {
                let err = match &other {
                    SinkState::Idle => SinkError::NotOpen,
                    _ => SinkError::Finalized,
                };
                *state = other;
                return Err(err);
            }
        };

        let end_time = end_time.max(statistics.start_time);
        statistics.end_time = Some(end_time);
        audit_log.push(AuditEntry::Lifecycle {
            run_id: self.run_id,
            timestamp: end_time,
            marker: LifecycleMarker::RunFinished,
        });

        let snapshot = Arc::new(RunSnapshot {
            run_id: self.run_id,
            statistics,
            memory,
            audit_log,
        });
        *state = SinkState::Finalized(snapshot.clone());

        log::info!(
            "[sink {}] finalized: {} operations recorded",
            self.run_id,
            snapshot.statistics.total_operations()
        );
        Ok(snapshot)
    }

    /// Point-in-time copy of the aggregated state
    ///
    /// `None` before the sink is opened. After finalization this is the
    /// frozen snapshot.
    pub fn snapshot(&self) -> Option<RunSnapshot> {
        let state = self.state.lock();
        match &*state {
            SinkState::Idle => None,
            SinkState::Open(run) => Some(RunSnapshot {
                run_id: self.run_id,
                statistics: run.statistics.clone(),
                memory: run.memory.clone(),
                audit_log: run.audit_log.clone(),
            }),
            SinkState::Finalized(snapshot) => Some(snapshot.as_ref().clone()),
        }
    }

    /// The frozen snapshot, if the sink has been finalized
    pub fn frozen(&self) -> Option<Arc<RunSnapshot>> {
        match &*self.state.lock() {
            SinkState::Finalized(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(&*self.state.lock(), SinkState::Finalized(_))
    }
}

impl EventRecorder for EventSink {
    fn record(&self, event: OutcomeEvent) -> SinkResult<()> {
        let mut state = self.state.lock();
        let run = open_run(&mut state)?;

        run.statistics.apply(&event);
        if event.outcome.is_success() {
            run.memory.push(MemoryEntry::from(&event));
        }
        run.audit_log.push(AuditEntry::outcome(event));
        Ok(())
    }
}

fn open_run(state: &mut SinkState) -> SinkResult<&mut OpenRun> {
    match state {
        SinkState::Open(run) => Ok(run),
        SinkState::Idle => Err(SinkError::NotOpen),
        SinkState::Finalized(_) => Err(SinkError::Finalized),
    }
}
