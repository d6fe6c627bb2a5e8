//! Error types for the nexus orchestration core.

/// Top-level error type for background workers and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    /// Rate-limited network call. Safe to retry after backing off.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// Network call that failed for good (timeout, malformed reply, other).
    #[error("network error: {0}")]
    TerminalNetwork(String),

    /// System update failed. Reported to the user, never fatal to the schedule.
    #[error("update error: {0}")]
    Updater(String),

    /// Clipboard could not be read. The watcher skips the tick.
    #[error("clipboard read error: {0}")]
    ClipboardRead(String),

    /// Clipboard could not be written.
    #[error("clipboard write error: {0}")]
    ClipboardWrite(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NexusError {
    /// Returns `true` for failures a worker may retry with backoff.
    ///
    /// Only rate limiting is retryable; timeouts are terminal by contract.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NexusError>;
