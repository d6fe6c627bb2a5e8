//! Background clipboard polling loop.
//!
//! The watcher task alone owns the [`ClipboardHistory`]. Other components
//! send it [`WatcherCommand`]s and see the history only through posted
//! [`UiEvent::ClipboardHistoryChanged`] snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clipboard::{Clipboard, ClipboardHistory};
use crate::ui::{Poster, UiEvent, View};

/// Default delay between clipboard samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// History mutations requested from outside the watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherCommand {
    Clear,
    SetCapacity(usize),
}

/// Polls a [`Clipboard`] and maintains the bounded history.
pub struct ClipboardWatcher<V: View> {
    clipboard: Arc<dyn Clipboard>,
    history: ClipboardHistory,
    poster: Poster<V>,
    poll_interval: Duration,
}

impl<V: View> ClipboardWatcher<V> {
    pub fn new(clipboard: Arc<dyn Clipboard>, capacity: usize, poster: Poster<V>) -> Self {
        Self {
            clipboard,
            history: ClipboardHistory::new(capacity),
            poster,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Spawn the polling loop on `runtime`.
    pub fn start(self, runtime: &Handle) -> WatcherHandle {
        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(self.run(cancel.clone(), command_rx));
        WatcherHandle {
            cancel,
            commands: command_tx,
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        cancel: CancellationToken,
        mut commands: mpsc::UnboundedReceiver<WatcherCommand>,
    ) {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            capacity = self.history.capacity(),
            "clipboard watcher started"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(command) = commands.recv() => self.apply_command(command),
                _ = ticker.tick() => self.tick().await,
            }
        }
        info!("clipboard watcher stopped");
    }

    /// Sample the clipboard once. Read failures skip the tick.
    pub(crate) async fn tick(&mut self) {
        let clipboard = Arc::clone(&self.clipboard);
        let sample = match tokio::task::spawn_blocking(move || clipboard.get_text()).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(e)) => {
                debug!("clipboard read skipped: {e}");
                return;
            }
            Err(e) => {
                warn!("clipboard read task failed: {e}");
                return;
            }
        };
        if self.history.observe(sample.as_deref()) {
            debug!(entries = self.history.len(), "clipboard history changed");
            self.publish();
        }
    }

    pub(crate) fn apply_command(&mut self, command: WatcherCommand) {
        match command {
            WatcherCommand::Clear => {
                self.history.clear();
                info!("clipboard history cleared");
            }
            WatcherCommand::SetCapacity(capacity) => {
                self.history.set_capacity(capacity);
                info!(capacity = self.history.capacity(), "clipboard history resized");
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.poster
            .emit(UiEvent::ClipboardHistoryChanged(self.history.snapshot()));
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &ClipboardHistory {
        &self.history
    }
}

/// Control handle for a running watcher.
#[derive(Debug)]
pub struct WatcherHandle {
    cancel: CancellationToken,
    commands: mpsc::UnboundedSender<WatcherCommand>,
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Signal the loop to exit after its current iteration.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Ask the watcher to clear its history. Returns `false` if it has exited.
    pub fn clear_history(&self) -> bool {
        self.send(WatcherCommand::Clear)
    }

    /// Ask the watcher to resize its history. Returns `false` if it has exited.
    pub fn set_capacity(&self, capacity: usize) -> bool {
        self.send(WatcherCommand::SetCapacity(capacity))
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
            warn!("clipboard watcher task ended abnormally: {e}");
        }
    }

    fn send(&self, command: WatcherCommand) -> bool {
        !self.cancel.is_cancelled() && self.commands.send(command).is_ok()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
