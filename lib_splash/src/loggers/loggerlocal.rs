//! # Local Logger
//!
//! Installs the global `tracing` subscriber for a binary. Events go to stdout
//! and, when a log directory is configured, to a fresh
//! `<app>-<timestamp>.log` file written through a non-blocking appender.
//! Older log files of the same application are pruned at start-up.
//!
//! `RUST_LOG` takes precedence over the configured level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Logger setup failures.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The log directory could not be created or scanned.
    #[error("log directory error: {0}")]
    Io(#[from] io::Error),

    /// The level is not a valid filter directive.
    #[error("invalid log level: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already set.
    #[error("subscriber already installed: {0}")]
    Init(String),
}

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LoggerLocalOptions {
    /// Filter directive used when `RUST_LOG` is unset (`info`, `lib_splash=debug`, ...).
    pub level: String,
    /// Directory for log files; stdout only when `None`.
    pub log_dir: Option<PathBuf>,
    /// How many older log files survive pruning.
    pub keep_files: usize,
}

impl Default for LoggerLocalOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            keep_files: 1,
        }
    }
}

/// Keeps the file writer alive; dropping it flushes pending lines.
#[derive(Debug)]
pub struct LoggerGuard {
    _worker: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggerGuard {
    /// The file this run logs to, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn log_file_name(app_name: &str) -> String {
    format!(
        "{}-{}.log",
        app_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Installs the global subscriber. Fails if one is already set.
pub fn setup_logging(app_name: &str, options: &LoggerLocalOptions) -> Result<LoggerGuard, LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level)?,
    };

    let mut worker = None;
    let mut log_file = None;
    let file_layer = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            prune_old_logs(dir, app_name, options.keep_files)?;

            let file_name = log_file_name(app_name);
            let appender = tracing_appender::rolling::never(dir, &file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            worker = Some(guard);
            log_file = Some(dir.join(file_name));
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggerError::Init(e.to_string()))?;

    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "file logging enabled");
    }

    Ok(LoggerGuard {
        _worker: worker,
        log_file,
    })
}

/// Deletes `<app>-*.log` files in `dir`, keeping the `keep` most recent.
///
/// Recency is the modification time, ties broken by file name. Returns how
/// many files were removed; individual delete failures are logged and skipped.
pub fn prune_old_logs(dir: &Path, app_name: &str, keep: usize) -> io::Result<usize> {
    let prefix = format!("{}-", app_name);
    let mut logs: Vec<(SystemTime, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".log"));
        if !is_ours {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        logs.push((modified, path));
    }

    logs.sort_by(|a, b| b.cmp(a));

    let mut removed = 0;
    for (_, path) in logs.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete old log file"),
        }
    }
    Ok(removed)
}
