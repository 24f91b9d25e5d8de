use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, HistoryBackend};
use crate::error::{ConvertError, RpcError, StartupError, StatsError, ValidateRequestError};
use crate::gateway::validator::ValidationVerdict;
use crate::gateway::{self, RpcGatewayClient, ValidationGatewayClient};
use crate::history::{HistoryRecorder, MemoryHistoryStore, SharedHistoryStore};
use crate::resolver;
use crate::router::{ConversionResult, ConversionRouter};
use crate::settings::{self, Settings};
use crate::stats::{StatsAggregationService, StatsSnapshot};
use crate::transform::{BuiltinDetector, BuiltinTransform, DetectFormat, Transform};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    NotRequested,
    Saved(u64),
    /// The conversion succeeded but the write did not.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub result: ConversionResult,
    pub history: HistoryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub format: String,
    pub verdict: ValidationVerdict,
}

/// Everything a request handler needs. Each call is independent; the only
/// shared state is the history store.
#[derive(Clone)]
pub struct FormatBridge {
    router: ConversionRouter,
    transform: Arc<dyn Transform>,
    rpc: RpcGatewayClient,
    validator: ValidationGatewayClient,
    detector: Arc<dyn DetectFormat>,
    recorder: HistoryRecorder,
    stats: StatsAggregationService,
}

impl FormatBridge {
    pub fn new(
        transform: Arc<dyn Transform>,
        detector: Arc<dyn DetectFormat>,
        rpc: RpcGatewayClient,
        validator: ValidationGatewayClient,
        store: SharedHistoryStore,
    ) -> Self {
        Self {
            router: ConversionRouter::new(transform.clone(), rpc.clone()),
            transform,
            rpc,
            validator,
            detector,
            recorder: HistoryRecorder::new(store.clone()),
            stats: StatsAggregationService::new(store),
        }
    }

    /// Built-in transform and detector, gateways and history from `config`.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let http = gateway::http_client(config.timeout)?;

        let store: SharedHistoryStore = match &config.history {
            HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new()),
            #[cfg(feature = "persistent-history")]
            HistoryBackend::Sled(path) => Arc::new(crate::history::SledHistoryStore::open(path)?),
            #[cfg(not(feature = "persistent-history"))]
            HistoryBackend::Sled(_) => return Err(StartupError::Unsupported("sled")),
        };

        info!(
            "[CONFIG] rpc={} validator={} timeout={:?} history={:?}",
            config.rpc_url, config.validator_url, config.timeout, config.history
        );

        Ok(Self::new(
            Arc::new(BuiltinTransform),
            Arc::new(BuiltinDetector),
            RpcGatewayClient::new(http.clone(), config.rpc_url.clone()),
            ValidationGatewayClient::new(http, config.validator_url.clone()),
            store,
        ))
    }

    pub fn router(&self) -> &ConversionRouter {
        &self.router
    }

    /// The in-process engine, also served to remote callers over `/rpc`.
    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }

    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    /// Convert, then save to history when the settings ask for it. Nothing
    /// is written when the conversion fails.
    pub async fn convert(
        &self,
        user_id: Option<i64>,
        input: &str,
        settings_text: &str,
    ) -> Result<Conversion, ConvertError> {
        let settings = Settings::parse(settings_text);
        let result = self.router.convert_with(input, settings_text, &settings).await?;

        let history = if settings.save_to_history {
            match self
                .recorder
                .record(user_id.unwrap_or(0), settings_text, input, &result)
            {
                Ok(id) => HistoryOutcome::Saved(id),
                Err(e) => {
                    warn!("[HISTORY] Conversion not saved: {}", e);
                    HistoryOutcome::Failed(e.to_string())
                }
            }
        } else {
            HistoryOutcome::NotRequested
        };

        Ok(Conversion { result, history })
    }

    /// Resolve the target format, then ask the remote validator.
    pub async fn validate(
        &self,
        explicit_format: Option<&str>,
        settings_text: &str,
        text: &str,
    ) -> Result<Validation, ValidateRequestError> {
        let manual = settings::parse(settings_text);
        let format = resolver::resolve(explicit_format, &manual, text, self.detector.as_ref())
            .ok_or(ValidateRequestError::FormatUnresolved)?;

        let verdict = self.validator.validate(&format, text).await?;
        Ok(Validation { format, verdict })
    }

    pub fn stats(&self, user_id: i64) -> Result<StatsSnapshot, StatsError> {
        self.stats.snapshot(user_id)
    }

    pub async fn backend_health(&self) -> Result<bool, RpcError> {
        self.rpc.health().await
    }
}
