//! Settings-driven conversion orchestration: parse `key=value` settings,
//! route conversions to the in-process transform or a JSON-RPC backend,
//! resolve and validate input formats against a remote validator, and keep
//! per-user history and usage statistics.

pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod resolver;
pub mod router;
pub mod service;
pub mod settings;
pub mod stats;
pub mod transform;

#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, HistoryBackend};
pub use error::{
    ConvertError, HistoryError, RpcError, StartupError, StatsError, ValidateRequestError, ValidationError,
};
pub use gateway::validator::ValidationVerdict;
pub use gateway::{RpcGatewayClient, ValidationGatewayClient};
pub use history::{HistoryEntry, HistoryRecorder, HistoryStore, MemoryHistoryStore, NewHistoryEntry};
pub use router::{ConversionResult, ConversionRouter, MetaSource};
pub use service::{Conversion, FormatBridge, HistoryOutcome, Validation};
pub use settings::{Engine, Settings, SettingsMap};
pub use stats::{StatsAggregationService, StatsSnapshot};
pub use transform::{BuiltinDetector, BuiltinTransform, ConversionMeta, DetectFormat, Transform, TransformOutput};
