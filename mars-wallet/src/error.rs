//! Wallet error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Keystore MAC mismatch or AEAD authentication failure.
    #[error("Wrong password")]
    WrongPassword,

    /// KDF or cipher failure outside the wrong-password case.
    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
