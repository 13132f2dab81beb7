//! Wallet generation and import.

use bip39::{Language, Mnemonic};
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::address::address_from_public_key;
use crate::bip32;
use crate::error::WalletError;

#[derive(Debug, Clone)]
pub struct GeneratedWallet {
    pub address: String,
    pub mnemonic: String,
    /// `0x`-prefixed hex. The caller owns getting rid of it.
    pub private_key: String,
}

#[derive(Debug, Clone)]
pub struct ImportedWallet {
    pub address: String,
    pub private_key: String,
}

/// Generate a fresh 12-word wallet and its standard Ethereum account.
pub fn generate() -> Result<GeneratedWallet, WalletError> {
    let mut entropy = Zeroizing::new([0u8; 16]);
    OsRng.fill_bytes(entropy.as_mut());

    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy.as_ref())
        .map_err(|e| WalletError::InvalidMnemonic(format!("{:?}", e)))?;
    let phrase = mnemonic.words().collect::<Vec<_>>().join(" ");

    let imported = import_from_mnemonic(&phrase)?;
    Ok(GeneratedWallet {
        address: imported.address,
        mnemonic: phrase,
        private_key: imported.private_key,
    })
}

/// Derive the standard account from a BIP39 phrase.
pub fn import_from_mnemonic(phrase: &str) -> Result<ImportedWallet, WalletError> {
    let phrase = phrase.trim();
    let mnemonic = Mnemonic::parse_in(Language::English, phrase)
        .map_err(|e| WalletError::InvalidMnemonic(format!("{:?}", e)))?;

    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let secret_bytes = bip32::derive_eth_secret(seed.as_ref())?;
    wallet_from_secret_bytes(secret_bytes.as_ref())
}

/// Import a raw secp256k1 private key; the `0x` prefix is optional.
pub fn import_from_private_key(hex_key: &str) -> Result<ImportedWallet, WalletError> {
    let digits = hex_key.trim().trim_start_matches("0x");
    if digits.len() != 64 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "expected 64 hex chars, got {}",
            digits.len()
        )));
    }
    let bytes = Zeroizing::new(
        hex::decode(digits).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?,
    );
    wallet_from_secret_bytes(&bytes)
}

fn wallet_from_secret_bytes(bytes: &[u8]) -> Result<ImportedWallet, WalletError> {
    let secret = SecretKey::from_slice(bytes)
        .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
    let address = address_from_public_key(&secret.public_key());
    Ok(ImportedWallet {
        address,
        private_key: format!("0x{}", hex::encode(bytes)),
    })
}
