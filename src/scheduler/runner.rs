//! Cancelable timer task driving a [`RecurringJob`].
//!
//! State machine: `Disabled -> Armed -> Firing -> Armed -> ...`; `disable()`
//! returns any state to `Disabled`. At most one timer task is live per
//! scheduler.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::scheduler::RecurringJob;
use crate::scheduler::daily::{Clock, SystemClock, delay_until, next_local_midnight, one_day_after};

/// Observer called with the new fire time each time the job re-arms.
pub type RearmHook = Arc<dyn Fn(DateTime<Local>) + Send + Sync>;

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Disabled,
    Armed,
    Firing,
}

/// Result of [`RecurringJobScheduler::enable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    /// A new timer was armed for this instant.
    Armed(DateTime<Local>),
    /// A timer was already live; nothing changed.
    AlreadyEnabled(DateTime<Local>),
}

impl EnableOutcome {
    pub fn next_fire_at(self) -> DateTime<Local> {
        match self {
            Self::Armed(at) | Self::AlreadyEnabled(at) => at,
        }
    }
}

struct ScheduledJob {
    next_fire_at: DateTime<Local>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Shared {
    phase: JobPhase,
    job: Option<ScheduledJob>,
    fires: u64,
}

/// Enable/disable-able daily scheduler for one job.
pub struct RecurringJobScheduler {
    job: Arc<dyn RecurringJob>,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    shared: Arc<Mutex<Shared>>,
    on_rearm: Option<RearmHook>,
}

impl RecurringJobScheduler {
    /// Create a disabled scheduler whose timer tasks run on `runtime`.
    pub fn new(job: Arc<dyn RecurringJob>, runtime: Handle) -> Self {
        Self {
            job,
            clock: Arc::new(SystemClock),
            runtime,
            shared: Arc::new(Mutex::new(Shared {
                phase: JobPhase::Disabled,
                job: None,
                fires: 0,
            })),
            on_rearm: None,
        }
    }

    /// Use `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Call `hook` with the next fire time after each run.
    pub fn with_rearm_hook(mut self, hook: RearmHook) -> Self {
        self.on_rearm = Some(hook);
        self
    }

    /// Arm the job for the next local midnight. Idempotent.
    pub fn enable(&self) -> EnableOutcome {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = &shared.job {
            return EnableOutcome::AlreadyEnabled(job.next_fire_at);
        }

        let next_fire_at = next_local_midnight(self.clock.now());
        let cancel = CancellationToken::new();
        let handle = self.runtime.spawn(timer_loop(TimerContext {
            job: Arc::clone(&self.job),
            clock: Arc::clone(&self.clock),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
            on_rearm: self.on_rearm.clone(),
            first_fire_at: next_fire_at,
        }));
        shared.phase = JobPhase::Armed;
        shared.job = Some(ScheduledJob {
            next_fire_at,
            cancel,
            handle,
        });
        info!(next_fire_at = %next_fire_at.format("%Y-%m-%d %H:%M"), "recurring job armed");
        EnableOutcome::Armed(next_fire_at)
    }

    /// Cancel the pending timer. Returns `false` if nothing was armed.
    ///
    /// A run already in progress finishes but does not re-arm.
    pub fn disable(&self) -> bool {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.phase = JobPhase::Disabled;
        match shared.job.take() {
            Some(job) => {
                job.cancel.cancel();
                info!("recurring job disabled");
                true
            }
            None => false,
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.shared.lock().unwrap_or_else(|e| e.into_inner()).phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase() != JobPhase::Disabled
    }

    /// Next scheduled fire time, if armed.
    pub fn next_fire_at(&self) -> Option<DateTime<Local>> {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .job
            .as_ref()
            .map(|job| job.next_fire_at)
    }

    /// Number of times the job body has started.
    pub fn fire_count(&self) -> u64 {
        self.shared.lock().unwrap_or_else(|e| e.into_inner()).fires
    }

    /// Disable and abort the timer task, including a run in progress.
    pub fn shutdown(&self) {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.phase = JobPhase::Disabled;
        if let Some(job) = shared.job.take() {
            job.cancel.cancel();
            job.handle.abort();
        }
    }
}

impl Drop for RecurringJobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct TimerContext {
    job: Arc<dyn RecurringJob>,
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
    on_rearm: Option<RearmHook>,
    first_fire_at: DateTime<Local>,
}

async fn timer_loop(ctx: TimerContext) {
    let mut fire_at = ctx.first_fire_at;
    loop {
        let delay = delay_until(ctx.clock.now(), fire_at);
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        {
            let mut shared = ctx.shared.lock().unwrap_or_else(|e| e.into_inner());
            if ctx.cancel.is_cancelled() {
                break;
            }
            shared.phase = JobPhase::Firing;
            shared.fires += 1;
        }

        info!("recurring job firing");
        if AssertUnwindSafe(ctx.job.run()).catch_unwind().await.is_err() {
            error!("recurring job panicked; schedule continues");
        }

        let next = one_day_after(fire_at);
        {
            let mut shared = ctx.shared.lock().unwrap_or_else(|e| e.into_inner());
            if ctx.cancel.is_cancelled() {
                break;
            }
            shared.phase = JobPhase::Armed;
            if let Some(job) = shared.job.as_mut() {
                job.next_fire_at = next;
            }
        }
        info!(next_fire_at = %next.format("%Y-%m-%d %H:%M"), "recurring job re-armed");
        if let Some(hook) = &ctx.on_rearm {
            hook(next);
        }
        fire_at = next;
    }
}
