//! Ethereum-style address derivation and validation.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use once_cell::sync::Lazy;
use regex::Regex;
use sha3::{Digest, Keccak256};

use crate::error::WalletError;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"));

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `0x`-prefixed 20-byte hex address, any case.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

/// Address of a secp256k1 public key: the low 20 bytes of the Keccak
/// hash of the uncompressed point, EIP-55 checksummed.
pub fn address_from_public_key(public_key: &PublicKey) -> String {
    let point = public_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point marker.
    let hash = keccak256(&point.as_bytes()[1..]);
    to_checksum_address(&hex::encode(&hash[12..]))
}

/// Canonicalize a hex address into EIP-55 mixed-case form.
///
/// Accepts 40 hex digits with or without the `0x` prefix, any case.
pub fn to_checksum_address(address: &str) -> String {
    let lower = address.trim_start_matches("0x").to_lowercase();
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Validate and canonicalize, rejecting anything that is not a
/// well-formed address.
pub fn canonicalize(address: &str) -> Result<String, WalletError> {
    let trimmed = address.trim();
    if !is_valid_address(trimmed) {
        return Err(WalletError::InvalidAddress(trimmed.to_string()));
    }
    Ok(to_checksum_address(trimmed))
}
