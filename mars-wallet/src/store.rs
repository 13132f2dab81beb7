//! Persisted mining-target and mnemonic state.
//!
//! Three artifacts live outside miner keystores: the plaintext
//! `mining_address.txt` (address-only mode), the encrypted mnemonic
//! store `wallet.enc`, and the keystore files themselves. The
//! address-only file always wins when both it and a keystore exist.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use mars_common::Layout;
use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::Params;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::address::is_valid_address;
use crate::error::WalletError;
use crate::keystore::read_first_keystore_address;

// Matches the keystore KDF strength.
const STORE_LOG_N: u8 = 18;
const STORE_R: u32 = 8;
const STORE_P: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletMode {
    Full,
    AddressOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletInfo {
    pub address: String,
    pub mode: WalletMode,
    pub has_mnemonic: bool,
    pub has_private_key: bool,
}

/// Envelope for the encrypted mnemonic store.
#[derive(Debug, Serialize, Deserialize)]
struct MnemonicStore {
    version: u32,
    kdf: String,
    log_n: u8,
    r: u32,
    p: u32,
    salt: String,
    nonce: String,
    ciphertext: String,
}

/// Persist the address-only mining target.
pub fn set_address_only(layout: &Layout, address: &str) -> Result<(), WalletError> {
    let address = address.trim();
    if !is_valid_address(address) {
        return Err(WalletError::InvalidAddress(address.to_string()));
    }
    std::fs::create_dir_all(layout.root())?;
    std::fs::write(layout.mining_address_path(), address)?;
    log::info!("Mining address set to {}", address);
    Ok(())
}

/// The configured mining address, if any.
///
/// `mining_address.txt` takes precedence; with a miner index the first
/// keystore in that miner's directory is consulted as a fallback.
pub fn get_stored_mining_address(
    layout: &Layout,
    miner_index: Option<u32>,
) -> Result<Option<String>, WalletError> {
    let address_file = layout.mining_address_path();
    if address_file.exists() {
        let contents = std::fs::read_to_string(&address_file)?;
        let trimmed = contents.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }

    if let Some(index) = miner_index {
        return read_first_keystore_address(layout, index);
    }
    Ok(None)
}

/// Encrypt and store the mnemonic under `wallet.enc`.
pub fn save_mnemonic(layout: &Layout, mnemonic: &str, password: &str) -> Result<(), WalletError> {
    save_mnemonic_with_params(layout, mnemonic, password, STORE_LOG_N, STORE_R, STORE_P)
}

pub fn save_mnemonic_with_params(
    layout: &Layout,
    mnemonic: &str,
    password: &str,
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<(), WalletError> {
    let mut salt = [0u8; 32];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_store_key(password, &salt, log_n, r, p)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| WalletError::Keystore(format!("cipher init failed: {}", e)))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), mnemonic.as_bytes())
        .map_err(|_| WalletError::Keystore("mnemonic encryption failed".into()))?;

    let store = MnemonicStore {
        version: 1,
        kdf: "scrypt".into(),
        log_n,
        r,
        p,
        salt: hex::encode(salt),
        nonce: hex::encode(nonce),
        ciphertext: hex::encode(ciphertext),
    };

    std::fs::create_dir_all(layout.root())?;
    std::fs::write(layout.wallet_enc_path(), serde_json::to_string_pretty(&store)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            layout.wallet_enc_path(),
            std::fs::Permissions::from_mode(0o600),
        )?;
    }

    log::info!("Mnemonic stored at {}", layout.wallet_enc_path().display());
    Ok(())
}

/// Decrypt the stored mnemonic. `None` when nothing (readable) is
/// stored; a wrong password is an error, not an absence.
pub fn load_mnemonic(layout: &Layout, password: &str) -> Result<Option<String>, WalletError> {
    let path = layout.wallet_enc_path();
    if !path.exists() {
        return Ok(None);
    }

    let store: MnemonicStore = match serde_json::from_str(&std::fs::read_to_string(&path)?) {
        Ok(store) => store,
        Err(err) => {
            // Pre-hardening files are not decryptable; treat as absent.
            log::warn!("Unreadable mnemonic store at {}: {}", path.display(), err);
            return Ok(None);
        }
    };

    if store.kdf != "scrypt" {
        return Err(WalletError::Keystore(format!("unsupported kdf {}", store.kdf)));
    }

    let salt = hex::decode(&store.salt).map_err(|e| WalletError::Keystore(e.to_string()))?;
    let nonce = hex::decode(&store.nonce).map_err(|e| WalletError::Keystore(e.to_string()))?;
    if nonce.len() != 12 {
        return Err(WalletError::Keystore("bad nonce length".into()));
    }
    let ciphertext =
        hex::decode(&store.ciphertext).map_err(|e| WalletError::Keystore(e.to_string()))?;

    let key = derive_store_key(password, &salt, store.log_n, store.r, store.p)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| WalletError::Keystore(format!("cipher init failed: {}", e)))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| WalletError::WrongPassword)?;

    let phrase = String::from_utf8(plaintext)
        .map_err(|_| WalletError::Keystore("stored mnemonic is not utf-8".into()))?;
    Ok(Some(phrase))
}

/// Summarize persisted wallet state, `None` when no address is known.
pub fn wallet_info(layout: &Layout, miner_index: Option<u32>) -> Result<Option<WalletInfo>, WalletError> {
    let Some(address) = get_stored_mining_address(layout, miner_index)? else {
        return Ok(None);
    };

    let mode = if layout.mining_address_path().exists() {
        WalletMode::AddressOnly
    } else {
        WalletMode::Full
    };

    let has_private_key = match miner_index {
        Some(index) => read_first_keystore_address(layout, index)?.is_some(),
        None => false,
    };

    Ok(Some(WalletInfo {
        address,
        mode,
        has_mnemonic: layout.wallet_enc_path().exists(),
        has_private_key,
    }))
}

fn derive_store_key(
    password: &str,
    salt: &[u8],
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    let params = Params::new(log_n, r, p, 32)
        .map_err(|e| WalletError::Keystore(format!("bad scrypt params: {}", e)))?;
    let mut key = Zeroizing::new([0u8; 32]);
    scrypt::scrypt(password.as_bytes(), salt, &params, key.as_mut())
        .map_err(|e| WalletError::Keystore(format!("scrypt failed: {}", e)))?;
    Ok(key)
}
