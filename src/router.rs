use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::gateway::RpcGatewayClient;
use crate::settings::{self, Engine, Settings, ENGINE};
use crate::transform::{ConversionMeta, Transform};

pub const FALLBACK_INPUT_FORMAT: &str = "auto";
pub const FALLBACK_OUTPUT_FORMAT: &str = "unknown";

/// Where a result's meta came from. The remote protocol only carries output
/// text, so for `rpc` the meta is rebuilt from the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaSource {
    Backend,
    Reconstructed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub output: String,
    pub meta: ConversionMeta,
    pub engine: Engine,
    pub meta_source: MetaSource,
}

pub fn reconstruct_meta(settings: &Settings) -> ConversionMeta {
    let format = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| fallback.to_string())
    };

    ConversionMeta {
        input_format: format(&settings.input_format, FALLBACK_INPUT_FORMAT),
        output_format: format(&settings.output_format, FALLBACK_OUTPUT_FORMAT),
    }
}

/// Sends each conversion to exactly one engine. A failing engine is
/// reported, never replaced by the other one.
#[derive(Clone)]
pub struct ConversionRouter {
    transform: Arc<dyn Transform>,
    rpc: RpcGatewayClient,
}

impl ConversionRouter {
    pub fn new(transform: Arc<dyn Transform>, rpc: RpcGatewayClient) -> Self {
        Self { transform, rpc }
    }

    pub async fn convert(&self, input: &str, settings_text: &str) -> Result<ConversionResult, ConvertError> {
        self.convert_with(input, settings_text, &Settings::parse(settings_text))
            .await
    }

    /// Same as [`convert`](Self::convert) for callers that already parsed
    /// `settings_text`.
    pub async fn convert_with(
        &self,
        input: &str,
        settings_text: &str,
        settings: &Settings,
    ) -> Result<ConversionResult, ConvertError> {
        let forwarded = settings::without_key(settings_text, ENGINE);

        debug!(
            "[ROUTER] engine={} input={:?} output={:?}",
            settings.engine.as_str(),
            settings.input_format,
            settings.output_format
        );

        let result = match settings.engine {
            Engine::Local => {
                let converted = self
                    .transform
                    .convert(input, &forwarded)
                    .map_err(ConvertError::Transform)?;

                ConversionResult {
                    output: converted.output,
                    meta: converted.meta,
                    engine: Engine::Local,
                    meta_source: MetaSource::Backend,
                }
            }
            Engine::Rpc => {
                let output = self.rpc.convert(input, &forwarded).await?;

                ConversionResult {
                    output,
                    meta: reconstruct_meta(settings),
                    engine: Engine::Rpc,
                    meta_source: MetaSource::Reconstructed,
                }
            }
        };

        info!(
            "[ROUTER] Converted {} -> {} via {} ({} bytes)",
            result.meta.input_format,
            result.meta.output_format,
            result.engine.as_str(),
            result.output.len()
        );

        Ok(result)
    }
}
