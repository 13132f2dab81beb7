//! Geth-compatible V3 keystore envelopes.
//!
//! Written envelopes are bit-compatible with what `geth account import`
//! produces: scrypt KDF, aes-128-ctr cipher, Keccak MAC over
//! `dk[16..32] || ciphertext`.

use aes::cipher::{KeyIvInit, StreamCipher};
use k256::SecretKey;
use mars_common::Layout;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::address::{address_from_public_key, keccak256, to_checksum_address};
use crate::error::WalletError;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

// Geth's standard scrypt parameters.
const STANDARD_LOG_N: u8 = 18;
const STANDARD_R: u32 = 8;
const STANDARD_P: u32 = 1;
const DKLEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub address: String,
    pub crypto: CryptoSection,
    pub id: String,
    pub version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CryptoSection {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KdfParams {
    pub dklen: u32,
    pub n: u64,
    pub p: u32,
    pub r: u32,
    pub salt: String,
}

fn scrypt_derive(
    password: &str,
    salt: &[u8],
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<Zeroizing<[u8; DKLEN]>, WalletError> {
    let params = scrypt::Params::new(log_n, r, p, DKLEN)
        .map_err(|e| WalletError::Keystore(format!("bad scrypt params: {}", e)))?;
    let mut dk = Zeroizing::new([0u8; DKLEN]);
    scrypt::scrypt(password.as_bytes(), salt, &params, dk.as_mut())
        .map_err(|e| WalletError::Keystore(format!("scrypt failed: {}", e)))?;
    Ok(dk)
}

/// Encrypt a private key with Geth's standard scrypt parameters.
pub fn encrypt_key(private_key_hex: &str, password: &str) -> Result<(KeystoreFile, String), WalletError> {
    encrypt_key_with_params(private_key_hex, password, STANDARD_LOG_N, STANDARD_R, STANDARD_P)
}

/// Parameterized variant; light parameters keep tests fast.
pub fn encrypt_key_with_params(
    private_key_hex: &str,
    password: &str,
    log_n: u8,
    r: u32,
    p: u32,
) -> Result<(KeystoreFile, String), WalletError> {
    let digits = private_key_hex.trim().trim_start_matches("0x");
    let secret_bytes = Zeroizing::new(
        hex::decode(digits).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?,
    );
    let secret = SecretKey::from_slice(&secret_bytes)
        .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
    let checksummed = address_from_public_key(&secret.public_key());
    let address_lower = checksummed.trim_start_matches("0x").to_lowercase();

    let mut salt = [0u8; 32];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; 16];
    OsRng.fill_bytes(&mut iv);

    let dk = scrypt_derive(password, &salt, log_n, r, p)?;

    let mut ciphertext = secret_bytes.to_vec();
    let mut cipher = Aes128Ctr::new_from_slices(&dk[..16], &iv)
        .map_err(|e| WalletError::Keystore(format!("cipher init failed: {}", e)))?;
    cipher.apply_keystream(&mut ciphertext);

    let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
    mac_input.extend_from_slice(&dk[16..32]);
    mac_input.extend_from_slice(&ciphertext);
    let mac = keccak256(&mac_input);

    let file = KeystoreFile {
        address: address_lower,
        crypto: CryptoSection {
            cipher: "aes-128-ctr".into(),
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams { iv: hex::encode(iv) },
            kdf: "scrypt".into(),
            kdfparams: KdfParams {
                dklen: DKLEN as u32,
                n: 1u64 << log_n,
                p,
                r,
                salt: hex::encode(salt),
            },
            mac: hex::encode(mac),
        },
        id: new_uuid_v4(),
        version: 3,
    };
    Ok((file, checksummed))
}

/// Decrypt a V3 envelope back into a `0x`-prefixed private key.
pub fn decrypt_key(file: &KeystoreFile, password: &str) -> Result<Zeroizing<String>, WalletError> {
    if file.version != 3 {
        return Err(WalletError::Keystore(format!("unsupported keystore version {}", file.version)));
    }
    if file.crypto.kdf != "scrypt" {
        return Err(WalletError::Keystore(format!("unsupported kdf {}", file.crypto.kdf)));
    }
    if file.crypto.cipher != "aes-128-ctr" {
        return Err(WalletError::Keystore(format!("unsupported cipher {}", file.crypto.cipher)));
    }

    let params = &file.crypto.kdfparams;
    if !params.n.is_power_of_two() || params.n < 2 {
        return Err(WalletError::Keystore(format!("bad scrypt n: {}", params.n)));
    }
    let log_n = params.n.trailing_zeros() as u8;

    let salt = hex::decode(&params.salt).map_err(|e| WalletError::Keystore(e.to_string()))?;
    let iv = hex::decode(&file.crypto.cipherparams.iv)
        .map_err(|e| WalletError::Keystore(e.to_string()))?;
    if iv.len() != 16 {
        return Err(WalletError::Keystore("bad iv length".into()));
    }
    let ciphertext =
        hex::decode(&file.crypto.ciphertext).map_err(|e| WalletError::Keystore(e.to_string()))?;

    let dk = scrypt_derive(password, &salt, log_n, params.r, params.p)?;

    let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
    mac_input.extend_from_slice(&dk[16..32]);
    mac_input.extend_from_slice(&ciphertext);
    let mac = keccak256(&mac_input);
    if hex::encode(mac) != file.crypto.mac {
        return Err(WalletError::WrongPassword);
    }

    let mut plaintext = Zeroizing::new(ciphertext);
    let mut cipher = Aes128Ctr::new_from_slices(&dk[..16], &iv)
        .map_err(|e| WalletError::Keystore(format!("cipher init failed: {}", e)))?;
    cipher.apply_keystream(&mut plaintext);

    Ok(Zeroizing::new(format!("0x{}", hex::encode(&*plaintext))))
}

/// Encrypt a key into `miners/<i>/keystore/UTC--<timestamp>--<addr>`.
///
/// Returns the checksummed address. The file is readable by the owner
/// only, matching what Geth itself writes.
pub fn write_keystore_to_miner(
    layout: &Layout,
    miner_index: u32,
    private_key_hex: &str,
    password: &str,
) -> Result<String, WalletError> {
    let (file, address) = encrypt_key(private_key_hex, password)?;
    write_keystore_file(layout, miner_index, &file, &address)
}

pub(crate) fn write_keystore_file(
    layout: &Layout,
    miner_index: u32,
    file: &KeystoreFile,
    address: &str,
) -> Result<String, WalletError> {
    let keystore_dir = layout.miner_keystore_dir(miner_index);
    std::fs::create_dir_all(&keystore_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.9fZ");
    let filename = format!("UTC--{}--{}", timestamp, file.address);
    let path = keystore_dir.join(filename);

    std::fs::write(&path, serde_json::to_string(file)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    log::info!("Wrote keystore for {} to {}", address, path.display());
    Ok(address.to_string())
}

/// Address embedded in the first keystore file of a miner directory,
/// canonicalized to checksummed `0x` form. `None` when the directory
/// holds no keystore.
pub fn read_first_keystore_address(
    layout: &Layout,
    miner_index: u32,
) -> Result<Option<String>, WalletError> {
    let keystore_dir = layout.miner_keystore_dir(miner_index);
    if !keystore_dir.is_dir() {
        return Ok(None);
    }

    let mut names: Vec<_> = std::fs::read_dir(&keystore_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.path())
        .collect();
    names.sort();

    let Some(path) = names.first() else {
        return Ok(None);
    };

    let file: KeystoreFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(Some(to_checksum_address(&file.address)))
}

fn new_uuid_v4() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let h = hex::encode(bytes);
    format!("{}-{}-{}-{}-{}", &h[..8], &h[8..12], &h[12..16], &h[16..20], &h[20..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727";
    const TEST_ADDR: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

    // Light scrypt so the suite stays fast.
    fn encrypt_light(password: &str) -> (KeystoreFile, String) {
        encrypt_key_with_params(TEST_KEY, password, 12, 8, 1).unwrap()
    }

    #[test]
    fn test_envelope_shape() {
        let (file, address) = encrypt_light("hunter2");
        assert_eq!(address, TEST_ADDR);
        assert_eq!(file.address, TEST_ADDR.trim_start_matches("0x").to_lowercase());
        assert_eq!(file.version, 3);
        assert_eq!(file.crypto.cipher, "aes-128-ctr");
        assert_eq!(file.crypto.kdf, "scrypt");
        assert_eq!(file.crypto.kdfparams.n, 4096);
        assert_eq!(file.id.len(), 36);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let (file, _) = encrypt_light("hunter2");
        let recovered = decrypt_key(&file, "hunter2").unwrap();
        assert_eq!(recovered.as_str(), TEST_KEY);
    }

    #[test]
    fn test_wrong_password_is_detected() {
        let (file, _) = encrypt_light("hunter2");
        assert!(matches!(decrypt_key(&file, "hunter3"), Err(WalletError::WrongPassword)));
    }

    #[test]
    fn test_write_and_read_back_address() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let (file, address) = encrypt_light("pw");
        write_keystore_file(&layout, 1, &file, &address).unwrap();

        let stored = read_first_keystore_address(&layout, 1).unwrap();
        assert_eq!(stored.as_deref(), Some(TEST_ADDR));
        // A miner without a keystore reports none.
        assert_eq!(read_first_keystore_address(&layout, 2).unwrap(), None);
    }

    #[test]
    fn test_keystore_filename_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let (file, address) = encrypt_light("pw");
        write_keystore_file(&layout, 1, &file, &address).unwrap();

        let entries: Vec<_> = std::fs::read_dir(layout.miner_keystore_dir(1))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().into_string().unwrap();
        assert!(name.starts_with("UTC--"));
        assert!(name.ends_with(&file.address));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = entries[0].metadata().unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
