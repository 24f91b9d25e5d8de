#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use formatbridge::gateway::{self, RpcGatewayClient, ValidationGatewayClient};
use formatbridge::{
    BuiltinDetector, ConversionMeta, FormatBridge, MemoryHistoryStore, Transform, TransformOutput,
};

/// Nothing listens on port 1, so connects are refused immediately.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub fn http() -> reqwest::Client {
    gateway::http_client(Duration::from_secs(2)).expect("Failed to build HTTP client")
}

/// Transform that records what it was called with.
#[derive(Default)]
pub struct RecordingTransform {
    pub calls: AtomicUsize,
    pub settings_seen: Mutex<Vec<String>>,
    pub fail_with: Option<String>,
}

impl RecordingTransform {
    pub fn failing(message: &str) -> Self {
        RecordingTransform {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transform for RecordingTransform {
    fn convert(&self, input: &str, settings_text: &str) -> Result<TransformOutput, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.settings_seen.lock().unwrap().push(settings_text.to_string());

        if let Some(message) = &self.fail_with {
            return Err(message.clone());
        }

        Ok(TransformOutput {
            output: format!("converted:{}", input),
            meta: ConversionMeta {
                input_format: "json".to_string(),
                output_format: "yaml".to_string(),
            },
        })
    }
}

pub fn bridge_with(
    transform: Arc<dyn Transform>,
    rpc_url: &str,
    validator_url: &str,
    store: Arc<MemoryHistoryStore>,
) -> FormatBridge {
    FormatBridge::new(
        transform,
        Arc::new(BuiltinDetector),
        RpcGatewayClient::new(http(), rpc_url),
        ValidationGatewayClient::new(http(), validator_url),
        store,
    )
}

/// mockito body callback answering with `result` under the request's own id.
pub fn rpc_result(result: Value) -> impl Fn(&mockito::Request) -> Vec<u8> + Send + Sync + 'static {
    move |request| {
        let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        serde_json::to_vec(&json!({ "jsonrpc": "2.0", "id": body["id"], "result": result })).unwrap()
    }
}

pub fn rpc_fault(code: i64, message: &str, data: Value) -> impl Fn(&mockito::Request) -> Vec<u8> + Send + Sync + 'static {
    let message = message.to_string();
    move |request| {
        let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "id": body["id"],
            "error": { "code": code, "message": message, "data": data }
        }))
        .unwrap()
    }
}
