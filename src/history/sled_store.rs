use std::path::Path;

use tracing::info;

use crate::error::HistoryError;

use super::{HistoryEntry, HistoryStore, NewHistoryEntry};

const HISTORY_TREE: &str = "conversions";

/// sled-backed history. Keys are `user_id ++ id`, both big-endian, so one
/// prefix scan yields a user's entries in insertion order.
#[derive(Clone)]
pub struct SledHistoryStore {
    db: sled::Db,
    tree: sled::Tree,
}

fn entry_key(user_id: i64, id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

impl SledHistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let tree = db.open_tree(HISTORY_TREE)?;
        info!("[HISTORY] Opened sled store at {:?} ({} entries)", path, tree.len());
        Ok(Self { db, tree })
    }

    pub fn flush(&self) -> Result<(), HistoryError> {
        self.tree.flush()?;
        Ok(())
    }
}

impl HistoryStore for SledHistoryStore {
    fn insert(&self, user_id: i64, entry: NewHistoryEntry) -> Result<u64, HistoryError> {
        // generate_id is monotonic, which keeps the scan order chronological
        let id = self.db.generate_id()? + 1;
        let record = HistoryEntry::assemble(id, user_id, entry);
        let bytes = serde_json::to_vec(&record)?;

        self.tree.insert(entry_key(user_id, id), bytes)?;
        Ok(id)
    }

    fn list_by_user(&self, user_id: i64) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.tree
            .scan_prefix(user_id.to_be_bytes())
            .rev()
            .map(|item| -> Result<HistoryEntry, HistoryError> {
                let (_, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}
