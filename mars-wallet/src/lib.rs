//! Wallet services for the Mars Credit supervisor.
//!
//! Generates and imports BIP39 wallets, derives the standard Ethereum
//! account, writes Geth-compatible V3 keystores into miner directories,
//! and persists the address-only mining target. Private keys never
//! outlive the call that produced or consumed them, and never persist
//! outside keystore envelopes.

pub mod address;
pub mod bip32;
pub mod error;
pub mod keystore;
pub mod store;
pub mod wallet;

pub use address::{is_valid_address, to_checksum_address};
pub use error::WalletError;
pub use store::{WalletInfo, WalletMode};
pub use wallet::{generate, import_from_mnemonic, import_from_private_key, GeneratedWallet, ImportedWallet};
