//! Clients for the remote collaborators: the JSON-RPC conversion backend and
//! the HTTP validator.

pub mod rpc;
pub mod validator;

use std::time::Duration;

pub use rpc::RpcGatewayClient;
pub use validator::ValidationGatewayClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP agent. The timeout covers connect, send and body read, so a
/// hung backend surfaces as an unavailability error.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}
