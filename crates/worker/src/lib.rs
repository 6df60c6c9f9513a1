//! Shared worker primitives.
//!
//! Task classification and spawn helpers for background work, a time-budgeted
//! driver for cooperative tasks that must share the UI thread, a thread-safe
//! hand-off queue into that thread, and generation clocks for lifecycles that
//! can be reset.

/// Time-budgeted driving of cooperative tasks.
pub mod budget;
/// Execution classes.
pub mod class;
/// Thread-safe hand-off queue drained by a single consumer.
pub mod handoff;
/// Spawn helpers with class metadata.
pub mod spawn;
/// Generation clocks and tokens.
pub mod token;

pub use budget::{CooperativeTask, DrainBudget, DrainReport, drain};
pub use class::TaskClass;
pub use handoff::{HandOff, HandOffSender};
pub use spawn::spawn;
pub use token::{GenerationClock, GenerationToken};
