//! Artifact Writer - persists a finished run
//!
//! - `agent_memory_snapshot.json`: successful attempts, in arrival order
//! - `simulation_statistics.json`: totals, timestamps and per-agent counts
//! - `stress_test_<YYYYmmdd_HHMMSS>.log`: the audit log, one entry per line

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use stress_sink::RunSnapshot;
use thiserror::Error;

pub const MEMORY_SNAPSHOT_FILE: &str = "agent_memory_snapshot.json";
pub const STATISTICS_FILE: &str = "simulation_statistics.json";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to write {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to serialize {path}: {error}")]
    Serialize {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

/// Locations of the files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub memory_snapshot: PathBuf,
    pub statistics: PathBuf,
    pub audit_log: PathBuf,
}

pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Name of the audit log, derived from the run's start time
    pub fn audit_log_name(snapshot: &RunSnapshot) -> String {
        format!(
            "stress_test_{}.log",
            snapshot.statistics.start_time.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write all artifacts, creating the output directory if needed
    pub fn write(&self, snapshot: &RunSnapshot) -> Result<ArtifactPaths, ArtifactError> {
        fs::create_dir_all(&self.output_dir).map_err(|error| ArtifactError::Io {
            path: self.output_dir.clone(),
            error,
        })?;

        let paths = ArtifactPaths {
            memory_snapshot: self.output_dir.join(MEMORY_SNAPSHOT_FILE),
            statistics: self.output_dir.join(STATISTICS_FILE),
            audit_log: self.output_dir.join(Self::audit_log_name(snapshot)),
        };

        write_json(&paths.memory_snapshot, &snapshot.memory)?;
        write_json(&paths.statistics, &snapshot.statistics)?;
        self.write_audit_log(&paths.audit_log, snapshot)?;

        log::info!(
            "[run {}] artifacts written to {}",
            snapshot.run_id,
            self.output_dir.display()
        );
        Ok(paths)
    }

    fn write_audit_log(&self, path: &Path, snapshot: &RunSnapshot) -> Result<(), ArtifactError> {
        let io_err = |error| ArtifactError::Io {
            path: path.to_path_buf(),
            error,
        };

        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        for entry in &snapshot.audit_log {
            writeln!(out, "{entry}").map_err(io_err)?;
        }
        out.flush().map_err(io_err)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let file = File::create(path).map_err(|error| ArtifactError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    let mut out = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut out, value).map_err(|error| ArtifactError::Serialize {
        path: path.to_path_buf(),
        error,
    })?;
    out.flush().map_err(|error| ArtifactError::Io {
        path: path.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use stress_core::{AgentId, OutcomeEvent, OutcomeKind};
    use stress_ports::EventRecorder;
    use stress_sink::EventSink;
    use uuid::Uuid;

    fn finished_run() -> RunSnapshot {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sink = EventSink::new(Uuid::new_v4(), vec![AgentId::new("A"), AgentId::new("B")]);
        sink.open(start, 2).unwrap();

        let outcomes = [
            ("A", "buy", OutcomeKind::Success),
            ("B", "sell", OutcomeKind::Failure),
            ("A", "sell", OutcomeKind::MissingData),
            ("B", "buy", OutcomeKind::Success),
        ];
        for (i, (agent, task, outcome)) in outcomes.into_iter().enumerate() {
            let ts = start + Duration::milliseconds(i as i64 * 10);
            sink.record(OutcomeEvent::new(agent.into(), task.into(), outcome, ts))
                .unwrap();
        }

        sink.finalize(start + Duration::seconds(1))
            .unwrap()
            .as_ref()
            .clone()
    }

    #[test]
    fn test_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("output");
        let snapshot = finished_run();

        let paths = ArtifactWriter::new(&out).write(&snapshot).unwrap();

        assert!(paths.memory_snapshot.exists());
        assert!(paths.statistics.exists());
        assert_eq!(
            paths.audit_log.file_name().unwrap().to_str().unwrap(),
            "stress_test_20240301_120000.log"
        );
    }

    #[test]
    fn test_statistics_document_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactWriter::new(dir.path()).write(&finished_run()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(paths.statistics).unwrap()).unwrap();
        assert_eq!(doc["total_operations"], 4);
        assert_eq!(doc["successful_operations"], 2);
        assert_eq!(doc["failed_operations"], 1);
        assert_eq!(doc["missing_data_events"], 1);
        assert!(doc["start_time"].is_string());
        assert!(doc["end_time"].is_string());
        assert_eq!(doc["agent_stats"]["A"]["total_operations"], 2);
        assert_eq!(doc["agent_stats"]["B"]["failed_operations"], 1);
    }

    #[test]
    fn test_memory_snapshot_holds_successes_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactWriter::new(dir.path()).write(&finished_run()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(paths.memory_snapshot).unwrap()).unwrap();
        let entries = doc.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["agent"], "A");
        assert_eq!(entries[0]["task"], "buy");
        assert_eq!(entries[1]["agent"], "B");
        assert!(entries[1]["timestamp"].is_string());
    }

    #[test]
    fn test_audit_log_lines() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactWriter::new(dir.path()).write(&finished_run()).unwrap();

        let text = fs::read_to_string(paths.audit_log).unwrap();
        let lines: Vec<_> = text.lines().collect();

        // start marker, four outcomes, finish marker
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains(" INFO run "));
        assert!(lines[2].ends_with("ERROR B sell FAILURE - failed to complete sell task"));
        assert!(lines[3].contains("WARN A sell MISSING_DATA"));
        assert!(lines[5].ends_with("finished"));
    }

    #[test]
    fn test_unwritable_directory_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let result = ArtifactWriter::new(blocker.join("out")).write(&finished_run());
        assert!(matches!(result, Err(ArtifactError::Io { .. })));
    }
}
