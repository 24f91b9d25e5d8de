use serde_json::Value;

/// Failures reaching the remote conversion backend over JSON-RPC.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// No usable response: connection refused, timeout, non-JSON body,
    /// an envelope without `result`/`error`, or a mismatched `id`.
    #[error("RPC transport error: {cause}")]
    Transport { cause: String },

    /// Well-formed JSON-RPC fault returned by the backend.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// A `result` arrived but does not have the expected shape.
    #[error("Bad RPC response: {0}")]
    Protocol(String),
}

impl RpcError {
    pub(crate) fn transport(cause: impl std::fmt::Display) -> Self {
        RpcError::Transport { cause: cause.to_string() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Validator service unavailable: {cause}")]
    ServiceUnavailable { cause: String },
}

impl ValidationError {
    pub(crate) fn unavailable(cause: impl std::fmt::Display) -> Self {
        ValidationError::ServiceUnavailable { cause: cause.to_string() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Conversion backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Conversion backend protocol error: {0}")]
    BackendProtocol(String),

    /// In-process transform failure, message shown verbatim.
    #[error("{0}")]
    Transform(String),
}

impl From<RpcError> for ConvertError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport { cause } => ConvertError::BackendUnavailable(cause),
            RpcError::Rpc { code, message, data } => {
                let detail = data
                    .as_ref()
                    .and_then(|d| d.get("message"))
                    .and_then(Value::as_str)
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default();
                ConvertError::BackendProtocol(format!("{} ({}){}", message, code, detail))
            }
            RpcError::Protocol(msg) => ConvertError::BackendProtocol(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid user id: {0}")]
    InvalidUser(i64),

    #[error("History storage error: {0}")]
    Storage(String),

    #[error("History codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(feature = "persistent-history")]
impl From<sled::Error> for HistoryError {
    fn from(err: sled::Error) -> Self {
        HistoryError::Storage(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Invalid user id: {0}")]
    InvalidUser(i64),

    #[error("Stats store error: {0}")]
    Store(String),
}

impl From<HistoryError> for StatsError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::InvalidUser(id) => StatsError::InvalidUser(id),
            other => StatsError::Store(other.to_string()),
        }
    }
}

/// A validation request that never reached a verdict.
#[derive(Debug, thiserror::Error)]
pub enum ValidateRequestError {
    #[error("Could not determine the input format to validate; set inputformat or pick a format")]
    FormatUnresolved,

    #[error(transparent)]
    Gateway(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("History backend not compiled in: {0}")]
    Unsupported(&'static str),
}
