//! JSON-RPC client for Mars Credit nodes.
//!
//! Stateless single-shot JSON-RPC over HTTP POST. Used by the miner
//! instance for its health probe and by pollers for balance, hashrate,
//! peer count and sync state. Read-only balance queries transparently
//! fall back to the hosted endpoint when the local node is down.

pub mod client;
pub mod error;
pub mod types;
pub mod wei;

pub use client::RpcClient;
pub use error::RpcError;
pub use types::SyncStatus;
pub use wei::wei_to_mars;

/// Hosted read-only endpoint used as the balance fallback.
pub const REMOTE_RPC_URL: &str = "https://rpc.marscredit.xyz";

/// Query a balance, preferring a local node when one is given.
///
/// Any local failure (connection refused, HTTP error, RPC error) falls
/// through to the remote endpoint. Returns the raw hex wei quantity.
pub async fn get_balance_prefer_local(
    local_url: Option<&str>,
    address: &str,
) -> Result<String, RpcError> {
    if let Some(url) = local_url {
        match RpcClient::new(url).eth_get_balance(address).await {
            Ok(balance) => return Ok(balance),
            Err(err) => {
                log::debug!("Local balance query via {} failed ({}), trying remote", url, err);
            }
        }
    }
    RpcClient::new(REMOTE_RPC_URL).eth_get_balance(address).await
}
