//! Local-time helpers for the daily schedule.

use chrono::{DateTime, Local, TimeDelta};
use std::time::Duration;

/// Fixed interval between recurring fires.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of the current local time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Start of the calendar day after `now`, in local time.
///
/// When local midnight does not exist (a DST gap), falls back to `now + 24h`.
pub fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .unwrap_or_else(|| now + TimeDelta::hours(24))
}

/// Time from `now` until `target`, zero if `target` has passed.
pub fn delay_until(now: DateTime<Local>, target: DateTime<Local>) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// `fire_at` advanced by one [`DAY`].
pub fn one_day_after(fire_at: DateTime<Local>) -> DateTime<Local> {
    fire_at + TimeDelta::hours(24)
}
