//! Events workers deliver to the UI thread.

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::assistant::QueryResult;
use crate::ui::post::Poster;
use crate::update::{UpdateOutcome, UpdateTrigger};

/// A state change produced off the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Clipboard history changed; carries a full snapshot, oldest first.
    ClipboardHistoryChanged(Vec<String>),
    /// A query was accepted and its busy indicator should start.
    QueryStarted { request_id: Uuid, text: String },
    /// The single terminal result for a query.
    QueryFinished(QueryResult),
    /// Clears the busy indicator for a query. Always follows `QueryFinished`.
    BusyCleared { request_id: Uuid },
    /// Auto-update toggled or re-armed.
    AutoUpdateChanged {
        enabled: bool,
        next_fire_at: Option<DateTime<Local>>,
    },
    /// A system update run began.
    UpdateStarted { trigger: UpdateTrigger },
    /// A system update run ended.
    UpdateFinished {
        trigger: UpdateTrigger,
        outcome: UpdateOutcome,
    },
    /// Text read from the clipboard for the input line.
    PasteText(String),
    /// Informational line for the transcript.
    Notice(String),
    /// Latest RAM usage sample, in percent.
    RamUsage(f64),
    /// Cleaned-up copy of the clipboard text.
    CleanedText(String),
}

/// UI state that can absorb [`UiEvent`]s.
pub trait View: 'static {
    fn apply(&mut self, event: UiEvent);
}

impl View for Vec<UiEvent> {
    fn apply(&mut self, event: UiEvent) {
        self.push(event);
    }
}

impl<V: View> Poster<V> {
    /// Post `event` to be applied to the view on the UI thread.
    pub fn emit(&self, event: UiEvent) {
        self.post(move |view: &mut V| view.apply(event));
    }
}
