//! Stress Ports
//!
//! Port definitions (traits) for the stress-test harness.
//! These define the boundaries between the workers and the infrastructure
//! they report to.

mod clock;
mod error;
mod recorder;

pub use clock::Clock;
pub use error::{SinkError, SinkResult};
pub use recorder::EventRecorder;
