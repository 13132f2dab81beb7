//! BIP32 key derivation over secp256k1.
//!
//! Only the fixed Ethereum account path `m/44'/60'/0'/0/0` is derived;
//! there is no extended-key export and no public parent derivation
//! beyond what the path needs.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{FieldBytes, ProjectivePoint, Scalar};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::WalletError;

const HARDENED: u32 = 0x8000_0000;

/// BIP44 path for the standard Ethereum account.
pub const ETH_ACCOUNT_PATH: [u32; 5] = [44 | HARDENED, 60 | HARDENED, HARDENED, 0, 0];

struct ExtendedKey {
    key: Scalar,
    chain_code: Zeroizing<[u8; 32]>,
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64], WalletError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key)
        .map_err(|e| WalletError::Keystore(format!("HMAC init failed: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    let repr = FieldBytes::clone_from_slice(bytes);
    let scalar: Option<Scalar> = Scalar::from_repr(repr).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}

fn master_from_seed(seed: &[u8]) -> Result<ExtendedKey, WalletError> {
    let digest = hmac_sha512(b"Bitcoin seed", &[seed])?;
    let mut il = [0u8; 32];
    il.copy_from_slice(&digest[..32]);
    let key = scalar_from_bytes(&il)
        .ok_or_else(|| WalletError::Keystore("seed produced an invalid master key".into()))?;
    let mut chain_code = Zeroizing::new([0u8; 32]);
    chain_code.copy_from_slice(&digest[32..]);
    Ok(ExtendedKey { key, chain_code })
}

fn derive_child(parent: &ExtendedKey, index: u32) -> Result<ExtendedKey, WalletError> {
    let digest = if index >= HARDENED {
        let key_bytes = parent.key.to_repr();
        hmac_sha512(
            parent.chain_code.as_ref(),
            &[&[0u8], key_bytes.as_slice(), &index.to_be_bytes()],
        )?
    } else {
        let point = (ProjectivePoint::GENERATOR * parent.key).to_affine();
        let encoded = point.to_encoded_point(true);
        hmac_sha512(
            parent.chain_code.as_ref(),
            &[encoded.as_bytes(), &index.to_be_bytes()],
        )?
    };

    let mut il = [0u8; 32];
    il.copy_from_slice(&digest[..32]);
    // BIP32: IL must parse below the curve order; the alternative has
    // probability < 2^-127 and is treated as a hard error.
    let tweak_repr = FieldBytes::clone_from_slice(&il);
    let tweak: Option<Scalar> = Scalar::from_repr(tweak_repr).into();
    let tweak =
        tweak.ok_or_else(|| WalletError::Keystore("child derivation out of range".into()))?;

    let key = tweak + parent.key;
    if bool::from(key.is_zero()) {
        return Err(WalletError::Keystore("child derivation produced zero key".into()));
    }

    let mut chain_code = Zeroizing::new([0u8; 32]);
    chain_code.copy_from_slice(&digest[32..]);
    Ok(ExtendedKey { key, chain_code })
}

/// Derive the raw secp256k1 secret at `m/44'/60'/0'/0/0`.
pub fn derive_eth_secret(seed: &[u8]) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    let mut node = master_from_seed(seed)?;
    for index in ETH_ACCOUNT_PATH {
        node = derive_child(&node, index)?;
    }
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&node.key.to_repr());
    Ok(out)
}
