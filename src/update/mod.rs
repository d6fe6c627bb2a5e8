//! System package updates.
//!
//! The [`Updater`] collaborator performs the privileged update; [`UpdateJob`]
//! wraps it with notifications and UI events and is what the daily scheduler,
//! "update now" and "update after delay" all run.

pub mod apt;
pub mod job;

pub use apt::PkexecAptUpdater;
pub use job::UpdateJob;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// What a successful update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Human-readable name of each step that ran, in order.
    pub steps: Vec<String>,
    pub elapsed: Duration,
}

impl UpdateReport {
    pub fn summary(&self) -> String {
        format!(
            "{} step(s) in {}s",
            self.steps.len(),
            self.elapsed.as_secs()
        )
    }
}

/// Privileged system update collaborator. Slow and opaque.
#[async_trait]
pub trait Updater: Send + Sync {
    async fn run_update(&self) -> Result<UpdateReport>;
}

/// Why an update run started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTrigger {
    /// The daily recurring job.
    Scheduled,
    /// "Update now".
    Manual,
    /// "Update after a few seconds".
    Delayed,
}

impl fmt::Display for UpdateTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scheduled => "Scheduled",
            Self::Manual => "Manual",
            Self::Delayed => "Delayed",
        })
    }
}

/// How an update run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Completed { summary: String },
    Failed { reason: String },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
