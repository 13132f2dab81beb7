//! RPC error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// Non-2xx status before an RPC envelope could be read.
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Error object extracted from the JSON-RPC response envelope.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The reply was 2xx but not a usable JSON-RPC envelope.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::InvalidResponse(err.to_string())
    }
}
