//! Single-shot JSON-RPC client.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::RpcError;
use crate::types::{RpcRequest, RpcResponse, SyncStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC-over-HTTP client bound to a single endpoint.
///
/// Each call is an independent POST with a monotonically increasing id;
/// there is no connection state to manage beyond reqwest's pool.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicI64,
}

impl RpcClient {
    pub fn new(url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and unwrap the response envelope.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        };

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(status.as_u16()));
        }

        let envelope: RpcResponse = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(RpcError::Rpc(format!("{} (code {})", error.message, error.code)));
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    pub async fn net_version(&self) -> Result<String, RpcError> {
        let result = self.call("net_version", json!([])).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RpcError::InvalidResponse("net_version is not a string".into()))
    }

    pub async fn net_peer_count(&self) -> Result<u64, RpcError> {
        let result = self.call("net_peerCount", json!([])).await?;
        parse_quantity(&result)
    }

    pub async fn eth_syncing(&self) -> Result<SyncStatus, RpcError> {
        let result = self.call("eth_syncing", json!([])).await?;
        match result {
            Value::Bool(false) => Ok(SyncStatus::NotSyncing),
            Value::Object(ref map) => {
                let current = map
                    .get("currentBlock")
                    .map(parse_quantity)
                    .transpose()?
                    .unwrap_or(0);
                let highest = map
                    .get("highestBlock")
                    .map(parse_quantity)
                    .transpose()?
                    .unwrap_or(0);
                Ok(SyncStatus::Syncing {
                    current_block: current,
                    highest_block: highest,
                })
            }
            other => Err(RpcError::InvalidResponse(format!(
                "unexpected eth_syncing result: {}",
                other
            ))),
        }
    }

    pub async fn eth_mining(&self) -> Result<bool, RpcError> {
        let result = self.call("eth_mining", json!([])).await?;
        result
            .as_bool()
            .ok_or_else(|| RpcError::InvalidResponse("eth_mining is not a bool".into()))
    }

    pub async fn eth_hashrate(&self) -> Result<u64, RpcError> {
        let result = self.call("eth_hashrate", json!([])).await?;
        parse_quantity(&result)
    }

    pub async fn eth_block_number(&self) -> Result<u64, RpcError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&result)
    }

    /// Balance of an address at `latest`, as a raw hex wei quantity.
    pub async fn eth_get_balance(&self, address: &str) -> Result<String, RpcError> {
        let result = self.call("eth_getBalance", json!([address, "latest"])).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RpcError::InvalidResponse("eth_getBalance is not a string".into()))
    }

    pub async fn miner_set_etherbase(&self, address: &str) -> Result<bool, RpcError> {
        let result = self.call("miner_setEtherbase", json!([address])).await?;
        Ok(result.as_bool().unwrap_or(true))
    }

    pub async fn miner_start(&self, threads: u32) -> Result<(), RpcError> {
        self.call("miner_start", json!([threads])).await?;
        Ok(())
    }

    pub async fn miner_stop(&self) -> Result<(), RpcError> {
        self.call("miner_stop", json!([])).await?;
        Ok(())
    }
}

/// Parse an Ethereum hex quantity (`"0x4b7"`) into a u64.
pub fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    let s = value
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("quantity is not a string: {}", value)))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|_| RpcError::InvalidResponse(format!("bad hex quantity: {}", s)))
}
