//! Clipboard access and the history watcher.

pub mod history;
pub mod system;
pub mod watcher;

pub use history::ClipboardHistory;
pub use system::SystemClipboard;
pub use watcher::{ClipboardWatcher, WatcherCommand, WatcherHandle};

use crate::error::Result;

/// Text clipboard collaborator.
///
/// Calls may block; async callers run them under `spawn_blocking`.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text. `Ok(None)` when the clipboard is empty or holds
    /// non-text content.
    fn get_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard contents with `text`.
    fn set_text(&self, text: &str) -> Result<()>;
}
