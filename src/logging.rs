//! Tracing subscriber setup.
//!
//! Logs go to stderr and, when a log directory is given, to a daily-rolling
//! file `nexus.log.YYYY-MM-DD` in that directory. `RUST_LOG` overrides the
//! default `nexus=info` filter.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{NexusError, Result};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "nexus=info,nexus_tray=info";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|e| NexusError::Config(format!("cannot install tracing subscriber: {e}")))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, "nexus.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|e| NexusError::Config(format!("cannot install tracing subscriber: {e}")))?;

    Ok(Some(guard))
}
