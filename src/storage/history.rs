//! Chat history store

use super::JsonStore;
use crate::models::ChatHistoryEntry;
use crate::utils::error::AppResult;
use std::path::PathBuf;

/// Prior exchanges backed by `chat_history.json`
#[derive(Debug, Clone)]
pub struct ChatHistory {
    store: JsonStore<ChatHistoryEntry>,
}

impl ChatHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn load(&self) -> AppResult<Vec<ChatHistoryEntry>> {
        self.store.load()
    }

    pub fn append(&self, entry: ChatHistoryEntry) -> AppResult<()> {
        self.store.append(entry)
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.clear()
    }
}

/// Render history as a prompt block, oldest exchange first
pub fn history_context(entries: &[ChatHistoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("\nUser: {}\nExpert: {}\n", entry.user_input, entry.expert_response))
        .collect()
}
