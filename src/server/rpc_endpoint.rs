use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::gateway::rpc::{
    normalize_text, RpcResponse, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, SERVER_ERROR,
};
use crate::service::FormatBridge;

fn string_param(params: Option<&Value>, name: &str) -> String {
    params
        .and_then(|p| p.get(name))
        .and_then(Value::as_str)
        .map(normalize_text)
        .unwrap_or_default()
}

/// JSON-RPC 2.0 conversion backend. Faults are reported in the envelope, so
/// the HTTP status is always 200.
pub async fn rpc_handler(State(bridge): State<FormatBridge>, Json(body): Json<Value>) -> Json<RpcResponse> {
    let id = body.get("id").cloned().unwrap_or(Value::Null);

    let version_ok = body.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION);
    let Some(method) = body.get("method").and_then(Value::as_str).filter(|_| version_ok) else {
        warn!("[RPC] Invalid request envelope");
        return Json(RpcResponse::failure(id, INVALID_REQUEST, "Invalid Request", None));
    };

    let response = match method {
        "health" => RpcResponse::success(id, json!({ "ok": true, "service": "conversion-rpc" })),
        "convert" => {
            let params = body.get("params");
            let input = string_param(params, "inputString");
            let settings = string_param(params, "settingsString");

            info!("[RPC] convert ({} bytes, settings {:?})", input.len(), settings);

            match bridge.transform().convert(&input, &settings) {
                Ok(converted) => RpcResponse::success(id, json!({ "output": converted.output })),
                Err(message) => {
                    warn!("[RPC] convert failed: {}", message);
                    RpcResponse::failure(id, SERVER_ERROR, "Server error", Some(json!({ "message": message })))
                }
            }
        }
        other => RpcResponse::failure(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({ "method": other })),
        ),
    };

    Json(response)
}
