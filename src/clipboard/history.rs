//! Bounded clipboard history with consecutive-duplicate suppression.

use std::collections::VecDeque;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Menu labels are cut to this many characters before the ellipsis.
pub const MENU_LABEL_MAX_CHARS: usize = 50;

/// Ordered clipboard history, oldest first.
///
/// Invariants: `len() <= capacity()`, no two adjacent entries are equal,
/// eviction is strictly oldest-first.
#[derive(Debug, Clone)]
pub struct ClipboardHistory {
    entries: VecDeque<String>,
    capacity: usize,
    /// Last sample accepted, kept across `clear()` so the current clipboard
    /// is not re-added on the next tick.
    last_observed: Option<String>,
}

impl Default for ClipboardHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ClipboardHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_observed: None,
        }
    }

    /// Feed one clipboard sample. Returns `true` if the history changed.
    ///
    /// Empty and non-text (`None`) samples are ignored, as is a sample equal
    /// to the previously accepted one. Whitespace is ordinary text.
    pub fn observe(&mut self, sample: Option<&str>) -> bool {
        let Some(text) = sample else {
            return false;
        };
        if text.is_empty() {
            return false;
        }
        if self.last_observed.as_deref() == Some(text) {
            return false;
        }
        self.last_observed = Some(text.to_owned());
        self.entries.push_back(text.to_owned());
        self.trim();
        true
    }

    /// Drop every entry. Returns `true` if anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_entries = !self.entries.is_empty();
        self.entries.clear();
        had_entries
    }

    /// Change the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Owned copy of the entries, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

/// Single-line menu label for a history entry.
///
/// Newlines collapse to spaces; text longer than [`MENU_LABEL_MAX_CHARS`]
/// characters is cut and suffixed with `...`.
pub fn menu_label(entry: &str) -> String {
    let flat: String = entry
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= MENU_LABEL_MAX_CHARS {
        return flat;
    }
    let mut label: String = flat.chars().take(MENU_LABEL_MAX_CHARS).collect();
    label.push_str("...");
    label
}

/// Tidied copy of clipboard text for the transcript.
pub fn cleaned_text(text: &str) -> String {
    format!("Cleaned Text: {}", text.trim())
}
