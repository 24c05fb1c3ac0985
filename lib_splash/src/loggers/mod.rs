//! # Logger Modules
//!
//! Process-wide `tracing` setup: stdout plus an optional per-run log file.

/// Subscriber installation and log-file pruning.
pub mod loggerlocal;

pub use loggerlocal::{prune_old_logs, setup_logging, LoggerError, LoggerGuard, LoggerLocalOptions};
