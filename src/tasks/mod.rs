//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stats Reporter: Logs a statistics snapshot at a configured interval

mod reporter;

pub use reporter::spawn_stats_reporter;
