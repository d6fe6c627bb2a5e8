//! UI-thread view model.
//!
//! Owned exclusively by the thread running the [`EventLoop`](super::EventLoop);
//! workers only reach it through posted [`UiEvent`]s.

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::assistant::{QueryError, QueryPayload};
use crate::ui::events::{UiEvent, View};
use crate::update::UpdateOutcome;

/// Who a transcript line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    You,
    Nexus,
    System,
    /// Output of the clipboard cleaner.
    Cleaner,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Self::You => "You",
            Self::Nexus => "Nexus",
            Self::System => "System",
            Self::Cleaner => "AI Cleaned",
        }
    }
}

/// One timestamped transcript line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Local>,
}

impl ChatLine {
    /// `[HH:MM] Speaker: text`
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.at.format("%H:%M"),
            self.speaker.label(),
            self.text
        )
    }
}

/// Visible state of the tray assistant.
#[derive(Debug, Default)]
pub struct UiState {
    /// Latest clipboard history snapshot, oldest first.
    pub clipboard_history: Vec<String>,
    pub transcript: Vec<ChatLine>,
    pending_queries: Vec<Uuid>,
    /// Contents of the query input line.
    pub input_line: String,
    pub auto_update: bool,
    pub next_update_at: Option<DateTime<Local>>,
    pub last_update: Option<UpdateOutcome>,
    /// Most recent RAM sample, in percent.
    pub ram_usage: Option<f64>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queries still showing a busy indicator.
    pub fn busy(&self) -> usize {
        self.pending_queries.len()
    }

    pub fn is_busy(&self) -> bool {
        !self.pending_queries.is_empty()
    }

    /// Status line text, e.g. `RAM Usage: 42.0%`.
    pub fn ram_label(&self) -> String {
        match self.ram_usage {
            Some(percent) => format!("RAM Usage: {percent:.1}%"),
            None => "RAM Usage: Loading...".to_owned(),
        }
    }

    fn push_line(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(ChatLine {
            speaker,
            text: text.into(),
            at: Local::now(),
        });
    }
}

/// Inline text shown for a failed query.
pub fn failure_message(error: &QueryError) -> String {
    match error {
        QueryError::RateLimited => "Too many retries. Please try again later.".to_owned(),
        QueryError::Timeout => "Request timed out. Please try again.".to_owned(),
        QueryError::Malformed(detail) => format!("Unexpected response from the AI service: {detail}"),
        QueryError::Other(detail) => format!("Error: {detail}"),
    }
}

impl View for UiState {
    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::ClipboardHistoryChanged(snapshot) => self.clipboard_history = snapshot,
            UiEvent::QueryStarted { request_id, text } => {
                self.pending_queries.push(request_id);
                self.push_line(Speaker::You, text);
            }
            UiEvent::QueryFinished(result) => match result.payload {
                QueryPayload::Success(text) => self.push_line(Speaker::Nexus, text),
                QueryPayload::Failure(error) => {
                    self.push_line(Speaker::System, failure_message(&error));
                }
            },
            UiEvent::BusyCleared { request_id } => {
                self.pending_queries.retain(|id| *id != request_id);
            }
            UiEvent::AutoUpdateChanged {
                enabled,
                next_fire_at,
            } => {
                self.auto_update = enabled;
                self.next_update_at = if enabled { next_fire_at } else { None };
            }
            UiEvent::UpdateStarted { trigger } => {
                self.push_line(Speaker::System, format!("{trigger} system update started"));
            }
            UiEvent::UpdateFinished { trigger, outcome } => {
                let line = match &outcome {
                    UpdateOutcome::Completed { .. } => format!("{trigger} system update completed"),
                    UpdateOutcome::Failed { reason } => {
                        format!("{trigger} system update failed: {reason}")
                    }
                };
                self.push_line(Speaker::System, line);
                self.last_update = Some(outcome);
            }
            UiEvent::PasteText(text) => self.input_line = text,
            UiEvent::Notice(text) => self.push_line(Speaker::System, text),
            UiEvent::RamUsage(percent) => self.ram_usage = Some(percent),
            UiEvent::CleanedText(text) => self.push_line(Speaker::Cleaner, text),
        }
    }
}
