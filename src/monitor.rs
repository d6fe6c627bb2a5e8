//! Periodic RAM usage sampling for the status line.
//!
//! Same shape as the clipboard watcher: a cancelable interval loop that
//! posts every sample as a [`UiEvent::RamUsage`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sysinfo::System;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ui::{Poster, UiEvent, View};

/// Default delay between RAM samples.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Source of memory usage readings.
pub trait MemorySampler: Send + Sync {
    /// Used memory as a percentage of total, `0.0..=100.0`.
    fn ram_percent(&self) -> f64;
}

/// [`MemorySampler`] backed by `sysinfo`.
pub struct SysinfoSampler {
    system: Mutex<System>,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for SysinfoSampler {
    fn ram_percent(&self) -> f64 {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_memory();
        used_memory_percent(&system)
    }
}

/// Used memory of a refreshed [`System`] as a percentage. `0.0` when the
/// total is unknown.
pub fn used_memory_percent(system: &System) -> f64 {
    let total = system.total_memory();
    if total == 0 {
        return 0.0;
    }
    system.used_memory() as f64 / total as f64 * 100.0
}

/// Samples a [`MemorySampler`] on a fixed interval.
pub struct SystemMonitor<V: View> {
    sampler: Arc<dyn MemorySampler>,
    poster: Poster<V>,
    interval: Duration,
}

impl<V: View> SystemMonitor<V> {
    pub fn new(sampler: Arc<dyn MemorySampler>, poster: Poster<V>) -> Self {
        Self {
            sampler,
            poster,
            interval: DEFAULT_MONITOR_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the sampling loop on `runtime`. The first sample is taken
    /// immediately.
    pub fn start(self, runtime: &Handle) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let task = runtime.spawn(self.run(cancel.clone()));
        MonitorHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs_f64(), "system monitor started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.sample().await,
            }
        }
        info!("system monitor stopped");
    }

    async fn sample(&self) {
        let sampler = Arc::clone(&self.sampler);
        match tokio::task::spawn_blocking(move || sampler.ram_percent()).await {
            Ok(percent) => self.poster.emit(UiEvent::RamUsage(percent)),
            Err(e) => warn!("ram sample task failed: {e}"),
        }
    }
}

/// Control handle for a running [`SystemMonitor`].
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("system monitor task ended abnormally: {e}");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
