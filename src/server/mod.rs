//! REST + JSON-RPC surface over [`FormatBridge`].

mod handlers;
mod rpc_endpoint;

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::service::FormatBridge;

pub use rpc_endpoint::rpc_handler;

pub fn app(bridge: FormatBridge) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_handler))
        .route("/convert", post(handlers::convert_handler))
        .route("/validate", post(handlers::validate_handler))
        .route("/stats", get(handlers::stats_handler))
        .route(
            "/history",
            get(handlers::history_list_handler).post(handlers::history_save_handler),
        )
        .route("/rpc", post(rpc_handler))
        .with_state(bridge)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(bridge: FormatBridge, addr: SocketAddr) -> std::io::Result<()> {
    let app = app(bridge);

    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;

    info!("[HTTP] Listening on {}", addr);
    info!("Endpoints:");
    info!("   GET  /health    - Service and RPC backend health");
    info!("   POST /convert   - Convert via local or rpc engine");
    info!("   POST /validate  - Validate input with the remote validator");
    info!("   GET  /stats     - Usage statistics (?userId=)");
    info!("   GET  /history   - Saved conversions (?userId=)");
    info!("   POST /history   - Save a conversion");
    info!("   POST /rpc       - JSON-RPC 2.0 conversion backend");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
}
