//! Detection Scheduler
//!
//! Runs face/expression detection against a live video feed at a fixed
//! cadence and keeps the overlay and session state consistent with the
//! results:
//! - `SessionState`: camera/detection/expression flags and derived values
//! - `DetectionCycle`: frame -> detector -> resize -> render -> state update
//! - `DetectionScheduler`: periodic ticks, never more than one cycle in flight

mod cycle;
mod scheduler;
mod state;

pub use cycle::{CycleOutcome, DetectionCycle};
pub use scheduler::{DetectionScheduler, SchedulerConfig, SchedulerStats};
pub use state::{SessionSnapshot, SessionState, SharedSession};

use thiserror::Error;

/// Scheduler error types
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Detection period must be positive, got {0}ms")]
    InvalidPeriod(u64),

    #[error("No async runtime available to drive detection")]
    NoRuntime,
}
