//! Simulation configuration
//!
//! Every field is optional in JSON and falls back to the defaults of the
//! stress-test runner. Validation is a separate step so that a config can be
//! loaded, overlaid with command line flags, and only then checked.

use crate::error::{ConfigError, ConfigResult};
use crate::values::{AgentId, TaskLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of one stress-test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Agent identities, one worker each
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentId>,

    /// Task labels drawn uniformly per attempt
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TaskLabel>,

    /// Probability that an attempt reports missing input data
    #[serde(default = "default_missing_data_prob")]
    pub missing_data_prob: f64,

    /// Probability that an attempt fails
    #[serde(default = "default_failure_prob")]
    pub failure_prob: f64,

    /// Attempts each agent performs
    #[serde(default = "default_operations_per_agent")]
    pub operations_per_agent: u64,

    /// Minimum delay before each attempt (seconds)
    #[serde(default = "default_min_delay")]
    pub min_delay: f64,

    /// Maximum delay before each attempt (seconds)
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,

    /// Where the artifact writer puts its files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Run seed; worker generators are derived from it. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Cooperative stop after this many seconds
    #[serde(default)]
    pub deadline_secs: Option<f64>,

    /// Cap on attempts across all agents
    #[serde(default)]
    pub max_total_operations: Option<u64>,
}

pub fn default_agents() -> Vec<AgentId> {
    ["StockAgent_A", "ForexAgent_B", "CryptoAgent_C", "ArbitrageAgent_D"]
        .into_iter()
        .map(AgentId::from)
        .collect()
}

pub fn default_tasks() -> Vec<TaskLabel> {
    ["buy", "sell", "hedge", "rebalance"]
        .into_iter()
        .map(TaskLabel::from)
        .collect()
}

fn default_missing_data_prob() -> f64 {
    0.2
}

fn default_failure_prob() -> f64 {
    0.1
}

fn default_operations_per_agent() -> u64 {
    100
}

fn default_min_delay() -> f64 {
    0.05
}

fn default_max_delay() -> f64 {
    0.15
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("stress_test_output")
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            tasks: default_tasks(),
            missing_data_prob: default_missing_data_prob(),
            failure_prob: default_failure_prob(),
            operations_per_agent: default_operations_per_agent(),
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            output_dir: default_output_dir(),
            seed: None,
            deadline_secs: None,
            max_total_operations: None,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_agents<I, A>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AgentId>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tasks<I, T>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskLabel>,
    {
        self.tasks = tasks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_probabilities(mut self, missing_data_prob: f64, failure_prob: f64) -> Self {
        self.missing_data_prob = missing_data_prob;
        self.failure_prob = failure_prob;
        self
    }

    pub fn with_delays(mut self, min_delay: f64, max_delay: f64) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_operations(mut self, operations_per_agent: u64) -> Self {
        self.operations_per_agent = operations_per_agent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every invariant of the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        validate_labels(
            self.agents.iter().map(AgentId::as_str),
            "agent",
            ConfigError::EmptyAgents,
            ConfigError::DuplicateAgent,
        )?;
        validate_labels(
            self.tasks.iter().map(TaskLabel::as_str),
            "task",
            ConfigError::EmptyTasks,
            ConfigError::DuplicateTask,
        )?;

        validate_probabilities(self.missing_data_prob, self.failure_prob)?;

        for (name, value) in [("min_delay", self.min_delay), ("max_delay", self.max_delay)] {
            if value < 0.0 || Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::InvalidDelay { name, value });
            }
        }
        if self.min_delay > self.max_delay {
            return Err(ConfigError::DelayRangeInverted {
                min: self.min_delay,
                max: self.max_delay,
            });
        }

        if self.operations_per_agent == 0 {
            return Err(ConfigError::ZeroOperations);
        }
        if self.max_total_operations == Some(0) {
            return Err(ConfigError::ZeroBudget);
        }
        if let Some(secs) = self.deadline_secs {
            if secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::InvalidDeadline(secs));
            }
        }

        Ok(())
    }

    /// Delay bounds as durations. Only meaningful after `validate`;
    /// unrepresentable values read as zero.
    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (seconds(self.min_delay), seconds(self.max_delay))
    }

    /// Run deadline, if one is configured and representable
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Attempts the run performs when nothing stops it early
    pub fn planned_operations(&self) -> u64 {
        let planned = self.agents.len() as u64 * self.operations_per_agent;
        match self.max_total_operations {
            Some(budget) => planned.min(budget),
            None => planned,
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Check a pair of outcome probabilities: each in [0, 1], sum at most 1
pub fn validate_probabilities(missing_data_prob: f64, failure_prob: f64) -> ConfigResult<()> {
    for (name, value) in [
        ("missing_data_prob", missing_data_prob),
        ("failure_prob", failure_prob),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ProbabilityOutOfRange { name, value });
        }
    }
    if missing_data_prob + failure_prob > 1.0 {
        return Err(ConfigError::ProbabilitySumExceedsOne {
            missing_data: missing_data_prob,
            failure: failure_prob,
        });
    }
    Ok(())
}

fn validate_labels<'a>(
    labels: impl ExactSizeIterator<Item = &'a str>,
    kind: &'static str,
    empty: ConfigError,
    duplicate: fn(String) -> ConfigError,
) -> ConfigResult<()> {
    if labels.len() == 0 {
        return Err(empty);
    }
    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(ConfigError::BlankIdentity { kind });
        }
        if !seen.insert(label) {
            return Err(duplicate(label.to_string()));
        }
    }
    Ok(())
}
