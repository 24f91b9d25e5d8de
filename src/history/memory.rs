use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::HistoryError;

use super::{HistoryEntry, HistoryStore, NewHistoryEntry};

/// Process-local store for tests and `--memory-history`.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
    next_id: AtomicU64,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn insert(&self, user_id: i64, entry: NewHistoryEntry) -> Result<u64, HistoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let mut entries = self
            .entries
            .write()
            .map_err(|_| HistoryError::Storage("history lock poisoned".to_string()))?;
        entries.push(HistoryEntry::assemble(id, user_id, entry));

        Ok(id)
    }

    fn list_by_user(&self, user_id: i64) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| HistoryError::Storage("history lock poisoned".to_string()))?;

        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}
