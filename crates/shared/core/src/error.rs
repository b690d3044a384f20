use thiserror::Error;

/// Invalid or unreadable simulation configuration
///
/// Always surfaced before any worker starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("at least one agent must be configured")]
    EmptyAgents,

    #[error("at least one task must be configured")]
    EmptyTasks,

    #[error("{kind} names must not be blank")]
    BlankIdentity { kind: &'static str },

    #[error("agent configured more than once: {0}")]
    DuplicateAgent(String),

    #[error("task configured more than once: {0}")]
    DuplicateTask(String),

    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("missing_data_prob + failure_prob must not exceed 1, got {missing_data} + {failure}")]
    ProbabilitySumExceedsOne { missing_data: f64, failure: f64 },

    #[error("{name} must be a finite, non-negative number of seconds, got {value}")]
    InvalidDelay { name: &'static str, value: f64 },

    #[error("min_delay ({min}) must not exceed max_delay ({max})")]
    DelayRangeInverted { min: f64, max: f64 },

    #[error("operations_per_agent must be at least 1")]
    ZeroOperations,

    #[error("max_total_operations must be at least 1 when set")]
    ZeroBudget,

    #[error("deadline_secs must be a finite, positive number, got {0}")]
    InvalidDeadline(f64),

    #[error("failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
