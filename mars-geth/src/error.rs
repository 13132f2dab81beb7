//! Error types for binary provisioning and genesis initialization.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GethError {
    /// No validated Geth binary at the expected path.
    #[error("Geth binary unavailable at {0}")]
    BinaryUnavailable(PathBuf),

    /// No release archive exists for this host, not even a fallback.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Download or extraction failed; carries the HTTP status or cause.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// `geth init` exited non-zero.
    #[error("Genesis init failed: {stderr}")]
    GenesisInitFailed { stdout: String, stderr: String },

    /// `geth version` ran but produced no parseable version string.
    #[error("Could not parse geth version output")]
    VersionUnparseable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
