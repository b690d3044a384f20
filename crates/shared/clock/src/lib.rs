//! Stress Clock Infrastructure
//!
//! Time sources for the harness:
//!
//! - `SystemClock`: wall-clock time for real runs
//! - `ManualClock`: fixed or stepped time for deterministic tests
//!
//! ## Usage
//!
//! ```ignore
//! use stress_clock::{ManualClock, SystemClock};
//! use chrono::{Duration, Utc};
//!
//! let wall = SystemClock::new();
//! let fixed = ManualClock::with_step(Utc::now(), Duration::milliseconds(1));
//! fixed.advance(Duration::seconds(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use stress_ports::Clock;
