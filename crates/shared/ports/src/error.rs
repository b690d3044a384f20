use thiserror::Error;

/// Errors raised by an event sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Events arrived before the run was opened
    #[error("event sink not opened yet")]
    NotOpen,

    /// A sink serves exactly one run
    #[error("event sink already opened")]
    AlreadyOpen,

    /// The run has been finalized; its sink accepts nothing further
    #[error("event sink already finalized")]
    Finalized,
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;
