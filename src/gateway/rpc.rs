use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        RpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i64, message: &str, data: Option<Value>) -> Self {
        RpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.to_string(),
                data,
            }),
        }
    }
}

/// Strip a leading byte-order mark and fold `\r\n` and lone `\r` into `\n`.
pub fn normalize_text(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Check a raw response body against the id we sent and pull out either the
/// `result` or the fault.
pub fn decode_response(body: &str, expected_id: &Value) -> Result<Value, RpcError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| RpcError::transport(format!("invalid JSON response: {}", e)))?;

    let Value::Object(mut envelope) = envelope else {
        return Err(RpcError::transport("response is not a JSON object"));
    };

    match envelope.get("id") {
        Some(id) if id == expected_id => {}
        Some(id) => {
            return Err(RpcError::transport(format!(
                "response id {} does not match request id {}",
                id, expected_id
            )));
        }
        None => return Err(RpcError::transport("response carries no id")),
    }

    if let Some(error) = envelope.remove("error") {
        let fault: RpcErrorObject = serde_json::from_value(error)
            .map_err(|e| RpcError::transport(format!("malformed error object: {}", e)))?;
        return Err(RpcError::Rpc {
            code: fault.code,
            message: fault.message,
            data: fault.data,
        });
    }

    envelope
        .remove("result")
        .ok_or_else(|| RpcError::transport("response carries neither result nor error"))
}

/// JSON-RPC 2.0 client for the remote conversion backend. Cloning shares the
/// connection pool; calls carry no session state.
#[derive(Debug, Clone)]
pub struct RpcGatewayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RpcGatewayClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = Value::String(Uuid::new_v4().to_string());
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.clone(),
            method: method.to_string(),
            params,
        };

        debug!("[RPC] -> {} {} id={}", self.endpoint, method, id);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("[RPC] {} unreachable: {}", self.endpoint, e);
                RpcError::transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(RpcError::transport)?;

        debug!("[RPC] <- {} ({} bytes)", status, body.len());

        decode_response(&body, &id)
    }

    /// Remote `convert`. The backend answers with output text only.
    pub async fn convert(&self, input: &str, settings_text: &str) -> Result<String, RpcError> {
        let params = json!({
            "inputString": normalize_text(input),
            "settingsString": normalize_text(settings_text),
        });

        let result = self.call("convert", params).await?;

        result
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RpcError::Protocol(format!("result has no output string: {}", result)))
    }

    pub async fn health(&self) -> Result<bool, RpcError> {
        let result = self.call("health", json!({})).await?;

        result
            .get("ok")
            .and_then(Value::as_bool)
            .ok_or_else(|| RpcError::Protocol(format!("health result has no ok flag: {}", result)))
    }
}
