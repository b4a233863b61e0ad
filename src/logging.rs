//! Logging setup for the `inies-dl` binary
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_logging`] once at startup to install a subscriber writing to stdout
//! and, when a log directory is configured, to `<dir>/<YYYY-MM-DD>-logs.txt`.
//!
//! `RUST_LOG` overrides [`LogConfig::filter`] when set. [`log_progress`] turns
//! client events into periodic progress lines.

use crate::error::{Error, Result};
use crate::types::Event;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor [`LogConfig::filter`] says otherwise
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directives in `EnvFilter` syntax
    pub filter: String,

    /// Directory for the dated log file (None = stdout only)
    pub log_dir: Option<PathBuf>,

    /// Whether to include target module names in logs
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            log_dir: None,
            include_targets: true,
        }
    }
}

impl LogConfig {
    /// Also write to a dated file under `dir`
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.filter).map_err(|e| Error::Config {
            message: format!("invalid log filter '{}': {e}", self.filter),
            key: Some("filter".to_string()),
        })
    }
}

/// Path of the log file for a given day
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}-logs.txt", date.format("%Y-%m-%d")))
}

/// Install the global subscriber
///
/// Returns the log file path when file output is enabled. Must be called at
/// most once per process.
pub fn init_logging(config: &LogConfig) -> Result<Option<PathBuf>> {
    let filter = config.env_filter()?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(config.include_targets);

    let (file_layer, file_path) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = log_file_path(dir, Local::now().date_naive());
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_target(config.include_targets)
                .with_ansi(false);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config {
            message: format!("failed to install tracing subscriber: {e}"),
            key: None,
        })?;

    Ok(file_path)
}

/// Completions between two progress lines: a tenth of the batch, at least one
pub fn progress_step(total: u64) -> u64 {
    (total / 10).max(1)
}

/// Log batch progress from client events until the batch finishes
///
/// Emits a line every [`progress_step`] resolved records and on the last one.
/// Returns the number of progress lines written.
pub async fn log_progress(mut events: broadcast::Receiver<Event>) -> u64 {
    let mut step = 1;
    let mut lines = 0;
    loop {
        match events.recv().await {
            Ok(Event::Listed { total }) => step = progress_step(total),
            Ok(Event::RecordFetched {
                completed, total, ..
            })
            | Ok(Event::RecordFailed {
                completed, total, ..
            }) => {
                if completed % step == 0 || completed == total {
                    tracing::info!(completed, total, "progress");
                    lines += 1;
                }
            }
            Ok(Event::Finished { .. }) | Err(broadcast::error::RecvError::Closed) => {
                return lines;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "progress events dropped");
            }
        }
    }
}
