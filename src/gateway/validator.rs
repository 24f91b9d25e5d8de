use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl ValidationVerdict {
    pub fn valid() -> Self {
        ValidationVerdict {
            ok: true,
            errors: Vec::new(),
        }
    }
}

/// Accept only a JSON object with a boolean `ok`. Anything else means we
/// never heard from the validator, which is not the same as a rejection.
pub fn decode_verdict(body: &str) -> Result<ValidationVerdict, ValidationError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ValidationError::unavailable(format!("non-JSON response: {}", e)))?;

    let ok = value
        .as_object()
        .and_then(|obj| obj.get("ok"))
        .and_then(Value::as_bool)
        .ok_or_else(|| ValidationError::unavailable("response has no boolean ok field"))?;

    if ok {
        return Ok(ValidationVerdict::valid());
    }

    let errors = value
        .get("errors")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ValidationVerdict { ok: false, errors })
}

#[derive(Debug, Clone)]
pub struct ValidationGatewayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ValidationGatewayClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn validate(&self, format: &str, text: &str) -> Result<ValidationVerdict, ValidationError> {
        debug!("[VALIDATE] -> {} format={} ({} bytes)", self.endpoint, format, text.len());

        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "format": format, "text": text }))
            .send()
            .await
            .map_err(|e| {
                warn!("[VALIDATE] {} unreachable: {}", self.endpoint, e);
                ValidationError::unavailable(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(ValidationError::unavailable)?;

        let verdict = decode_verdict(&body).inspect_err(|e| {
            warn!("[VALIDATE] Bad validator response (HTTP {}): {}", status, e);
        })?;

        debug!("[VALIDATE] <- ok={} errors={}", verdict.ok, verdict.errors.len());
        Ok(verdict)
    }
}
