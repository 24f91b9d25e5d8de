//! Append-only conversion history and the recorder that writes to it.

mod memory;
#[cfg(feature = "persistent-history")]
mod sled_store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HistoryError;
use crate::router::ConversionResult;

pub use memory::MemoryHistoryStore;
#[cfg(feature = "persistent-history")]
pub use sled_store::SledHistoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub settings_text: String,
    pub input_text: String,
    pub output_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub user_id: i64,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub settings_text: String,
    pub input_text: String,
    pub output_text: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub(crate) fn assemble(id: u64, user_id: i64, entry: NewHistoryEntry) -> Self {
        HistoryEntry {
            id,
            user_id,
            input_format: entry.input_format,
            output_format: entry.output_format,
            settings_text: entry.settings_text,
            input_text: entry.input_text,
            output_text: entry.output_text,
            created_at: entry.created_at,
        }
    }
}

/// Storage behind history and stats. Entries are never updated in place.
pub trait HistoryStore: Send + Sync {
    fn insert(&self, user_id: i64, entry: NewHistoryEntry) -> Result<u64, HistoryError>;

    /// Most recent first.
    fn list_by_user(&self, user_id: i64) -> Result<Vec<HistoryEntry>, HistoryError>;
}

pub type SharedHistoryStore = Arc<dyn HistoryStore>;

fn check_user(user_id: i64) -> Result<(), HistoryError> {
    if user_id <= 0 {
        return Err(HistoryError::InvalidUser(user_id));
    }
    Ok(())
}

#[derive(Clone)]
pub struct HistoryRecorder {
    store: SharedHistoryStore,
}

impl HistoryRecorder {
    pub fn new(store: SharedHistoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedHistoryStore {
        &self.store
    }

    /// Persist a finished conversion. `settings_text` is what the user
    /// typed, `engine` line included.
    pub fn record(
        &self,
        user_id: i64,
        settings_text: &str,
        input: &str,
        result: &ConversionResult,
    ) -> Result<u64, HistoryError> {
        self.record_entry(
            user_id,
            NewHistoryEntry {
                input_format: Some(result.meta.input_format.clone()),
                output_format: Some(result.meta.output_format.clone()),
                settings_text: settings_text.to_string(),
                input_text: input.to_string(),
                output_text: result.output.clone(),
                created_at: Utc::now(),
            },
        )
    }

    pub fn record_entry(&self, user_id: i64, entry: NewHistoryEntry) -> Result<u64, HistoryError> {
        check_user(user_id)?;

        let id = self.store.insert(user_id, entry)?;
        info!("[HISTORY] Saved entry {} for user {}", id, user_id);
        Ok(id)
    }

    pub fn list(&self, user_id: i64) -> Result<Vec<HistoryEntry>, HistoryError> {
        check_user(user_id)?;
        self.store.list_by_user(user_id)
    }
}
