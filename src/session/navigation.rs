//! Navigation capability used by the lifecycle and the client guard.

use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// How a navigation treats the history stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationMode {
    /// Append a new entry.
    Push,
    /// Overwrite the current entry, so "back" cannot return to it.
    Replace,
    /// Drop the whole history and start over at the target.
    Reset,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str, mode: NavigationMode);
}

/// In-memory history stack.
#[derive(Debug)]
pub struct HistoryNavigator {
    entries: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self {
            entries: Mutex::new(vec![initial.to_string()]),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pop the current entry, like the browser back button.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() > 1 {
            entries.pop();
        }
        entries.last().cloned()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str, mode: NavigationMode) {
        debug!(path, ?mode, "navigate");
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match mode {
            NavigationMode::Push => entries.push(path.to_string()),
            NavigationMode::Replace => {
                entries.pop();
                entries.push(path.to_string());
            }
            NavigationMode::Reset => {
                entries.clear();
                entries.push(path.to_string());
            }
        }
    }
}
