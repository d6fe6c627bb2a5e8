//! Daily recurring job scheduling.
//!
//! A single enable/disable-able job fires at the next local midnight, then
//! every 24 hours, regardless of how each run turns out.

pub mod daily;
pub mod runner;

pub use daily::{Clock, DAY, SystemClock, next_local_midnight};
pub use runner::{EnableOutcome, JobPhase, RecurringJobScheduler};

use async_trait::async_trait;

/// Body of a recurring job.
///
/// Runs to completion on the scheduler's timer task. Failures must be
/// handled inside; the schedule re-arms whatever happens.
#[async_trait]
pub trait RecurringJob: Send + Sync + 'static {
    async fn run(&self);
}
