//! Geth provisioning for the Mars Credit supervisor.
//!
//! Treats Geth as an opaque executable with a known CLI: this crate
//! fetches and validates the binary, initializes per-miner chain data
//! from the fixed genesis, and composes the mining argument vector.

pub mod args;
pub mod binary;
pub mod error;
pub mod genesis;

pub use binary::{BinaryStatus, DownloadProgress, DownloadedBinary};
pub use error::GethError;

/// Mars Credit network and chain id.
pub const NETWORK_ID: u64 = 110110;

/// Fixed bootstrap peers baked into every miner's argv.
pub const BOOTNODES: [&str; 4] = [
    "enode://9b28e9847f25d342a152d55ad484d7f26a36ab0c57bd73dbd2a5f5f7c62f9e9a5b45e9a25c25a172a28e2ec8b4e9cdd2d389a9bdbc9b95a5d9e1b6f1f8b2dce8@146.190.48.116:30303",
    "enode://c52f63b3aa9b1cc1acbad75bb00f388b1cfdcbb59f2f0dc0cb6cbeb19a6e4b61db3b3b51f6f8e9c5f5ff0c9d1f9f6c5f7e22a9f8a2c8ffcb0c9b9d1fdd1b5a49@146.190.131.194:30303",
    "enode://e77a5e0d5e4c2ff973861d1458d1e07d9198ba75a4dd1c8b73485b3ea42b7b5edc5e9e9bde5cdd84f4ebd9a07ba37a1c3a2bbf60cba8f03a9d4a1f93c7ba7dd2@174.138.49.76:30303",
    "enode://5a2c39b6d2f47e96c28d7d7e1e83eb1b1d334a8d0ce6a601eb2a7e0bd06ab8a6f8cc0a2dcdf899bd9c2f3ebc9e5d2f10305a9cc9a1a8e8413e4e1c21ab0e0b13@64.23.134.130:30303",
];

/// Geth release pinned by the installer.
pub const GETH_VERSION: &str = "1.13.15-c5ba367e";

/// Base URL for official Geth release archives.
pub const DOWNLOAD_BASE: &str = "https://gethstore.blob.core.windows.net/builds";
