//! Desktop clipboard adapter backed by `arboard`.

use crate::clipboard::Clipboard;
use crate::error::{NexusError, Result};

/// The real system clipboard.
///
/// A fresh `arboard::Clipboard` is opened per call: the handle is not `Sync`
/// and reads happen on blocking-pool threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&self) -> Result<Option<String>> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| NexusError::ClipboardRead(e.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(NexusError::ClipboardRead(e.to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| NexusError::ClipboardWrite(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| NexusError::ClipboardWrite(e.to_string()))
    }
}
