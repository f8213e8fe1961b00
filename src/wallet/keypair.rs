//! Key-pair generation on NIST P-256.
//!
//! The public key is carried as the raw `X || Y` coordinates, each a 32-byte
//! big-endian integer. There is no SEC1 tag byte and no compression.

use crate::error::{BlockchainError, Result};
use crate::utils::{ecdsa_p256_public_key, ecdsa_p256_sha256_sign_digest, new_key_pair};
use crate::wallet::address::derive_address;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Width of one field element / signature scalar on P-256.
pub const COORDINATE_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 2 * COORDINATE_LEN;

const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

/// A private key and its public point. Not `Clone`: a key pair belongs to exactly
/// one wallet and its private half is wiped when that wallet is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    pkcs8: Vec<u8>,
    #[zeroize(skip)]
    public_key: Vec<u8>,
}

impl KeyPair {
    pub fn generate() -> Result<KeyPair> {
        let pkcs8 = new_key_pair()?;
        let key_pair = Self::from_pkcs8(pkcs8).map_err(|e| {
            BlockchainError::KeyGeneration(format!("Generated key could not be loaded: {e}"))
        })?;
        log::debug!("Generated P-256 key pair");
        Ok(key_pair)
    }

    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<KeyPair> {
        let point = ecdsa_p256_public_key(&pkcs8)?;
        let public_key = coordinates_from_sec1(&point)?;
        Ok(KeyPair { pkcs8, public_key })
    }

    /// Rebuild a key pair from persisted parts, rejecting a public key that does
    /// not belong to the private key.
    pub fn from_parts(pkcs8: Vec<u8>, public_key: &[u8]) -> Result<KeyPair> {
        let key_pair = Self::from_pkcs8(pkcs8)?;
        if key_pair.public_key != public_key {
            return Err(BlockchainError::MalformedKey(
                "Stored public key does not match the private key".to_string(),
            ));
        }
        Ok(key_pair)
    }

    /// `X || Y`, 64 bytes.
    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    pub fn get_address(&self) -> String {
        derive_address(&self.public_key)
    }

    /// ECDSA P-256/SHA-256 signature over `message` as fixed-width `r || s`.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(&self.pkcs8, message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &data_encoding::HEXLOWER.encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Generate a key pair and return it together with its public key bytes.
pub fn generate_key_pair() -> Result<(KeyPair, Vec<u8>)> {
    let key_pair = KeyPair::generate()?;
    let public_key = key_pair.get_public_key().to_vec();
    Ok((key_pair, public_key))
}

fn coordinates_from_sec1(point: &[u8]) -> Result<Vec<u8>> {
    match point.split_first() {
        Some((&SEC1_UNCOMPRESSED_TAG, coordinates)) if coordinates.len() == PUBLIC_KEY_LEN => {
            Ok(coordinates.to_vec())
        }
        _ => Err(BlockchainError::MalformedKey(format!(
            "Expected a {}-byte uncompressed point, got {} bytes",
            PUBLIC_KEY_LEN + 1,
            point.len()
        ))),
    }
}

/// Split `bytes` into two equal halves and left-pad each to `COORDINATE_LEN`.
///
/// The split point is taken from the length of the data as stored. An odd length
/// or a half wider than a field element cannot be split unambiguously.
pub fn split_fixed_width(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("odd length {} cannot be split in half", bytes.len()));
    }
    let half = bytes.len() / 2;
    if half == 0 || half > COORDINATE_LEN {
        return Err(format!(
            "component length {half} outside 1..={COORDINATE_LEN}"
        ));
    }
    let mut out = vec![0u8; 2 * COORDINATE_LEN];
    out[COORDINATE_LEN - half..COORDINATE_LEN].copy_from_slice(&bytes[..half]);
    out[2 * COORDINATE_LEN - half..].copy_from_slice(&bytes[half..]);
    Ok(out)
}

/// Rebuild the uncompressed SEC1 point from stored `X || Y` bytes.
pub fn sec1_from_coordinates(public_key: &[u8]) -> Result<Vec<u8>> {
    let coordinates = split_fixed_width(public_key).map_err(BlockchainError::MalformedKey)?;
    let mut point = Vec::with_capacity(PUBLIC_KEY_LEN + 1);
    point.push(SEC1_UNCOMPRESSED_TAG);
    point.extend(coordinates);
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_pair_shape() {
        let (key_pair, public_key) = generate_key_pair().unwrap();
        assert_eq!(public_key.len(), PUBLIC_KEY_LEN);
        assert_eq!(key_pair.get_public_key(), public_key.as_slice());
    }

    #[test]
    fn test_key_pairs_are_unique() {
        let (_, a) = generate_key_pair().unwrap();
        let (_, b) = generate_key_pair().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let key_pair = KeyPair::generate().unwrap();
        let restored =
            KeyPair::from_parts(key_pair.get_pkcs8().to_vec(), key_pair.get_public_key()).unwrap();
        assert_eq!(restored.get_address(), key_pair.get_address());
    }

    #[test]
    fn test_from_parts_rejects_foreign_public_key() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        let result = KeyPair::from_parts(a.get_pkcs8().to_vec(), b.get_public_key());
        assert!(matches!(result, Err(BlockchainError::MalformedKey(_))));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key_pair = KeyPair::generate().unwrap();
        let rendered = format!("{key_pair:?}");
        assert!(rendered.contains("public_key"));
        assert!(!rendered.contains("pkcs8"));
    }

    #[test]
    fn test_split_fixed_width_pads_short_halves() {
        let out = split_fixed_width(&[0xAA, 0xBB]).unwrap();
        assert_eq!(out.len(), 64);
        assert_eq!(out[31], 0xAA);
        assert_eq!(out[63], 0xBB);
        assert!(out[..31].iter().all(|b| *b == 0));
        assert!(out[32..63].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_split_fixed_width_rejects_bad_lengths() {
        assert!(split_fixed_width(&[1, 2, 3]).is_err());
        assert!(split_fixed_width(&[]).is_err());
        assert!(split_fixed_width(&[0u8; 66]).is_err());
    }

    #[test]
    fn test_sec1_from_coordinates() {
        let key_pair = KeyPair::generate().unwrap();
        let point = sec1_from_coordinates(key_pair.get_public_key()).unwrap();
        assert_eq!(point.len(), 65);
        assert_eq!(point[0], 0x04);
        assert_eq!(&point[1..], key_pair.get_public_key());

        let odd = sec1_from_coordinates(&key_pair.get_public_key()[..63]);
        assert!(matches!(odd, Err(BlockchainError::MalformedKey(_))));
    }
}
