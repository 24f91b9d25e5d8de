use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::DEFAULT_TIMEOUT;

pub const DEFAULT_RPC_URL: &str = "http://localhost:3001/rpc";
pub const DEFAULT_VALIDATOR_URL: &str = "http://localhost:8082/validate";
pub const DEFAULT_HISTORY_DB: &str = "formatbridge-history.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackend {
    Memory,
    Sled(PathBuf),
}

/// Where the remote collaborators live and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rpc_url: String,
    pub validator_url: String,
    pub timeout: Duration,
    pub history: HistoryBackend,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            validator_url: DEFAULT_VALIDATOR_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            history: HistoryBackend::Sled(PathBuf::from(DEFAULT_HISTORY_DB)),
        }
    }
}
