mod common;

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use formatbridge::gateway::{self, RpcGatewayClient};
use formatbridge::RpcError;

use common::{http, rpc_fault, rpc_result, UNREACHABLE};

#[tokio::test]
async fn test_convert_sends_normalized_envelope() {
    println!("=== RPC: request envelope and normalization ===");

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rpc")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "jsonrpc": "2.0",
            "method": "convert",
            "params": {
                "inputString": "{\"a\":1}\n",
                "settingsString": "inputformat=json\noutputformat=yaml"
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(rpc_result(json!({ "output": "a: 1\n" })))
        .expect(1)
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let output = client
        .convert("\u{feff}{\"a\":1}\r\n", "inputformat=json\r\noutputformat=yaml")
        .await
        .expect("Conversion should succeed");

    assert_eq!(output, "a: 1\n");
    mock.assert_async().await;

    println!("✓ BOM stripped, CRLF folded, output returned\n");
}

#[tokio::test]
async fn test_rpc_fault_is_decoded() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .with_body_from_request(rpc_fault(-32000, "Server error", json!({ "message": "Invalid JSON" })))
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let err = client.convert("{", "").await.unwrap_err();

    match err {
        RpcError::Rpc { code, message, data } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "Server error");
            assert_eq!(data, Some(json!({ "message": "Invalid JSON" })));
        }
        other => panic!("Expected RPC fault, got {:?}", other),
    }
}

#[tokio::test]
async fn test_envelope_without_result_or_error_is_transport_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .with_body_from_request(|request| {
            let body: serde_json::Value = serde_json::from_slice(request.body().unwrap()).unwrap();
            serde_json::to_vec(&json!({ "jsonrpc": "2.0", "id": body["id"] })).unwrap()
        })
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let err = client.call("convert", json!({})).await.unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }), "Got {:?}", err);
}

#[tokio::test]
async fn test_mismatched_id_is_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .with_body(r#"{"jsonrpc":"2.0","id":"someone-else","result":{"output":"x"}}"#)
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let err = client.convert("x", "").await.unwrap_err();

    match err {
        RpcError::Transport { cause } => assert!(cause.contains("does not match"), "cause: {}", cause),
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_html_error_page_is_transport_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .with_status(502)
        .with_body("<html><body>Bad Gateway</body></html>")
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let err = client.convert("x", "").await.unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }));
}

#[tokio::test]
async fn test_result_without_output_is_protocol_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .with_body_from_request(rpc_result(json!({ "text": "nope" })))
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    let err = client.convert("x", "").await.unwrap_err();

    assert!(matches!(err, RpcError::Protocol(_)), "Got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = RpcGatewayClient::new(http(), format!("{}/rpc", UNREACHABLE));
    let err = client.convert("x", "").await.unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }));
}

#[tokio::test]
async fn test_silent_backend_times_out() {
    println!("=== RPC: timeout surfaces as transport error ===");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let http = gateway::http_client(Duration::from_millis(300)).unwrap();
    let client = RpcGatewayClient::new(http, format!("http://{}/rpc", addr));

    let err = client.convert("x", "").await.unwrap_err();
    assert!(matches!(err, RpcError::Transport { .. }), "Got {:?}", err);

    println!("✓ Timed out instead of hanging\n");
}

#[tokio::test]
async fn test_health() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rpc")
        .match_body(Matcher::PartialJson(json!({ "method": "health" })))
        .with_body_from_request(rpc_result(json!({ "ok": true, "service": "conversion-rpc" })))
        .create_async()
        .await;

    let client = RpcGatewayClient::new(http(), format!("{}/rpc", server.url()));
    assert!(client.health().await.unwrap());
}
