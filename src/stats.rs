use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;
use tracing::debug;

use crate::error::StatsError;
use crate::history::{HistoryEntry, SharedHistoryStore};

pub const UNKNOWN_FORMAT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub input: String,
    pub output: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total: u64,
    pub by_input: Vec<KeyCount>,
    pub by_output: Vec<KeyCount>,
    pub by_pair: Vec<PairCount>,
}

fn coalesce(format: &Option<String>) -> String {
    match format.as_deref().map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => UNKNOWN_FORMAT.to_string(),
    }
}

/// Count occurrences, keeping first-seen order so equal counts stay stable
/// after the sort.
fn tally<K: Eq + Hash + Clone>(keys: impl Iterator<Item = K>) -> Vec<(K, u64)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, u64)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn aggregate(entries: &[HistoryEntry]) -> StatsSnapshot {
    let by_input = tally(entries.iter().map(|e| coalesce(&e.input_format)))
        .into_iter()
        .map(|(key, count)| KeyCount { key, count })
        .collect();

    let by_output = tally(entries.iter().map(|e| coalesce(&e.output_format)))
        .into_iter()
        .map(|(key, count)| KeyCount { key, count })
        .collect();

    let by_pair = tally(
        entries
            .iter()
            .map(|e| (coalesce(&e.input_format), coalesce(&e.output_format))),
    )
    .into_iter()
    .map(|((input, output), count)| PairCount { input, output, count })
    .collect();

    StatsSnapshot {
        total: entries.len() as u64,
        by_input,
        by_output,
        by_pair,
    }
}

#[derive(Clone)]
pub struct StatsAggregationService {
    store: SharedHistoryStore,
}

impl StatsAggregationService {
    pub fn new(store: SharedHistoryStore) -> Self {
        Self { store }
    }

    pub fn snapshot(&self, user_id: i64) -> Result<StatsSnapshot, StatsError> {
        if user_id <= 0 {
            return Err(StatsError::InvalidUser(user_id));
        }

        let entries = self.store.list_by_user(user_id)?;
        let snapshot = aggregate(&entries);

        debug!(
            "[STATS] user={} total={} inputs={} outputs={} pairs={}",
            user_id,
            snapshot.total,
            snapshot.by_input.len(),
            snapshot.by_output.len(),
            snapshot.by_pair.len()
        );

        Ok(snapshot)
    }
}
