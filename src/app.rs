//! Orchestrator owning every background component.
//!
//! [`Nexus`] lives on the UI thread. Its methods return immediately; slow
//! work runs on the tokio runtime and reports back through the [`Poster`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::local::UrlOpener;
use crate::assistant::{AiService, GeminiClient, QueryDispatcher, Sleeper};
use crate::clipboard::history::cleaned_text;
use crate::clipboard::{Clipboard, ClipboardWatcher, SystemClipboard, WatcherHandle};
use crate::config::NexusConfig;
use crate::error::Result;
use crate::monitor::{MemorySampler, MonitorHandle, SysinfoSampler, SystemMonitor};
use crate::notify::{DesktopNotifier, Notifier};
use crate::scheduler::{Clock, EnableOutcome, RecurringJobScheduler};
use crate::ui::{Poster, UiEvent, View};
use crate::update::{PkexecAptUpdater, UpdateJob, UpdateTrigger, Updater};

/// External collaborators, injected so tests can substitute them.
#[derive(Clone)]
pub struct Collaborators {
    pub updater: Arc<dyn Updater>,
    pub ai: Arc<dyn AiService>,
    pub notifier: Arc<dyn Notifier>,
    pub clipboard: Arc<dyn Clipboard>,
    pub memory: Arc<dyn MemorySampler>,
}

impl Collaborators {
    /// The real desktop adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if the AI service HTTP client cannot be built.
    pub fn production(config: &NexusConfig) -> Result<Self> {
        let gemini = GeminiClient::from_config(&config.assistant)?;
        if !gemini.has_api_key() {
            warn!(
                env = %config.assistant.api_key_env,
                "no AI API key configured; queries will fail until it is set"
            );
        }
        Ok(Self {
            updater: Arc::new(PkexecAptUpdater::new()),
            ai: Arc::new(gemini),
            notifier: Arc::new(DesktopNotifier::default()),
            clipboard: Arc::new(SystemClipboard::new()),
            memory: Arc::new(SysinfoSampler::new()),
        })
    }
}

/// The tray assistant core.
pub struct Nexus<V: View> {
    config: NexusConfig,
    poster: Poster<V>,
    runtime: Handle,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn Clipboard>,
    memory: Arc<dyn MemorySampler>,
    update_job: UpdateJob<V>,
    scheduler: RecurringJobScheduler,
    dispatcher: QueryDispatcher<V>,
    watcher: Option<WatcherHandle>,
    monitor: Option<MonitorHandle>,
    shutdown: CancellationToken,
}

impl<V: View> Nexus<V> {
    /// Wire up components. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: NexusConfig,
        collaborators: Collaborators,
        poster: Poster<V>,
        runtime: Handle,
    ) -> Self {
        let update_job = UpdateJob::new(
            Arc::clone(&collaborators.updater),
            Arc::clone(&collaborators.notifier),
            poster.clone(),
        );

        let rearm_poster = poster.clone();
        let scheduler = RecurringJobScheduler::new(Arc::new(update_job.clone()), runtime.clone())
            .with_rearm_hook(Arc::new(move |next: DateTime<Local>| {
                rearm_poster.emit(UiEvent::AutoUpdateChanged {
                    enabled: true,
                    next_fire_at: Some(next),
                });
            }));

        let dispatcher =
            QueryDispatcher::new(Arc::clone(&collaborators.ai), poster.clone(), runtime.clone())
                .with_request_timeout(config.assistant.request_timeout())
                .with_local_commands(config.assistant.local_commands);

        Self {
            config,
            poster,
            runtime,
            notifier: collaborators.notifier,
            clipboard: collaborators.clipboard,
            memory: collaborators.memory,
            update_job,
            scheduler,
            dispatcher,
            watcher: None,
            monitor: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use `clock` for the daily schedule.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.scheduler = self.scheduler.with_clock(clock);
        self
    }

    /// Use `sleeper` for query backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.dispatcher = self.dispatcher.with_sleeper(sleeper);
        self
    }

    /// Use `opener` for `search` quick commands.
    pub fn with_url_opener(mut self, opener: UrlOpener) -> Self {
        self.dispatcher = self.dispatcher.with_url_opener(opener);
        self
    }

    /// Start the clipboard watcher, the RAM monitor and, if configured, the
    /// daily update.
    pub fn start(&mut self) {
        if self.config.clipboard.enabled && self.watcher.is_none() {
            let watcher = ClipboardWatcher::new(
                Arc::clone(&self.clipboard),
                self.config.clipboard.history_capacity,
                self.poster.clone(),
            )
            .with_poll_interval(self.config.clipboard.poll_interval());
            self.watcher = Some(watcher.start(&self.runtime));
        }
        if self.config.monitor.enabled && self.monitor.is_none() {
            let monitor = SystemMonitor::new(Arc::clone(&self.memory), self.poster.clone())
                .with_interval(self.config.monitor.poll_interval());
            self.monitor = Some(monitor.start(&self.runtime));
        }
        if self.config.auto_update.enabled_at_start {
            self.set_auto_update(true);
        }
        info!("nexus started");
    }

    /// Toggle the daily update job.
    pub fn set_auto_update(&self, enabled: bool) {
        if enabled {
            let next = match self.scheduler.enable() {
                EnableOutcome::Armed(next) => {
                    self.notifier.notify(
                        "Auto Update Enabled",
                        &format!("Next update scheduled for {}", next.format("%H:%M")),
                    );
                    next
                }
                EnableOutcome::AlreadyEnabled(next) => next,
            };
            self.poster.emit(UiEvent::AutoUpdateChanged {
                enabled: true,
                next_fire_at: Some(next),
            });
        } else {
            if self.scheduler.disable() {
                self.notifier.notify(
                    "Auto Update Disabled",
                    "Automatic system updates have been turned off.",
                );
            }
            self.poster.emit(UiEvent::AutoUpdateChanged {
                enabled: false,
                next_fire_at: None,
            });
        }
    }

    pub fn auto_update_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn next_update_at(&self) -> Option<DateTime<Local>> {
        self.scheduler.next_fire_at()
    }

    /// Run a system update now, in the background.
    pub fn update_now(&self) {
        let job = self.update_job.clone();
        self.runtime.spawn(async move {
            job.execute(UpdateTrigger::Manual).await;
        });
    }

    /// Run a system update once after `delay`. Cancelled by shutdown.
    pub fn update_after(&self, delay: Duration) {
        self.poster.emit(UiEvent::Notice(format!(
            "System update will start in {} seconds",
            delay.as_secs()
        )));
        let job = self.update_job.clone();
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => debug!("delayed update cancelled"),
                () = tokio::time::sleep(delay) => {
                    job.execute(UpdateTrigger::Delayed).await;
                }
            }
        });
    }

    /// [`update_after`](Self::update_after) with the configured delay.
    pub fn update_after_default_delay(&self) {
        self.update_after(Duration::from_secs(self.config.auto_update.delayed_update_secs));
    }

    /// Submit an AI query. `None` for blank input.
    pub fn submit(&self, text: &str) -> Option<Uuid> {
        self.dispatcher.submit(text)
    }

    /// Ask the watcher to clear history. `false` if the watcher is not running.
    pub fn clear_clipboard_history(&self) -> bool {
        self.watcher.as_ref().is_some_and(WatcherHandle::clear_history)
    }

    /// Ask the watcher to resize history. `false` if the watcher is not running.
    pub fn set_history_capacity(&self, capacity: usize) -> bool {
        self.watcher
            .as_ref()
            .is_some_and(|watcher| watcher.set_capacity(capacity))
    }

    /// Put `text` back on the system clipboard.
    pub fn copy_to_clipboard(&self, text: String) {
        let clipboard = Arc::clone(&self.clipboard);
        let poster = self.poster.clone();
        self.runtime.spawn(async move {
            let written = tokio::task::spawn_blocking(move || clipboard.set_text(&text)).await;
            let notice = match written {
                Ok(Ok(())) => "Copied to clipboard".to_owned(),
                Ok(Err(e)) => format!("Could not copy to clipboard: {e}"),
                Err(e) => format!("Could not copy to clipboard: {e}"),
            };
            poster.emit(UiEvent::Notice(notice));
        });
    }

    /// Read the clipboard into the query input line.
    pub fn paste_clipped_data(&self) {
        let clipboard = Arc::clone(&self.clipboard);
        let poster = self.poster.clone();
        self.runtime.spawn(async move {
            let event = match tokio::task::spawn_blocking(move || clipboard.get_text()).await {
                Ok(Ok(Some(text))) if !text.trim().is_empty() => UiEvent::PasteText(text),
                Ok(Ok(_)) => UiEvent::Notice("Clipboard is empty".to_owned()),
                Ok(Err(e)) => UiEvent::Notice(format!("Could not read clipboard: {e}")),
                Err(e) => UiEvent::Notice(format!("Could not read clipboard: {e}")),
            };
            poster.emit(event);
        });
    }

    /// Post a cleaned-up copy of the current clipboard text to the transcript.
    pub fn clean_clipped_data(&self) {
        let clipboard = Arc::clone(&self.clipboard);
        let poster = self.poster.clone();
        self.runtime.spawn(async move {
            let event = match tokio::task::spawn_blocking(move || clipboard.get_text()).await {
                Ok(Ok(Some(text))) if !text.is_empty() => UiEvent::CleanedText(cleaned_text(&text)),
                Ok(Ok(_)) => UiEvent::Notice("Clipboard is empty".to_owned()),
                Ok(Err(e)) => UiEvent::Notice(format!("Could not read clipboard: {e}")),
                Err(e) => UiEvent::Notice(format!("Could not read clipboard: {e}")),
            };
            poster.emit(event);
        });
    }

    /// Stop every background worker. Query workers already in flight finish
    /// on their own; their posts become no-ops once the UI shuts down.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.scheduler.shutdown();
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }
        info!("nexus stopped");
    }
}
