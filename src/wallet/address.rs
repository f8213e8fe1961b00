//! Address derivation and validation.
//!
//! `address = base58(version || RIPEMD160(SHA256(pub_key)) || checksum)` where the
//! checksum is the first four bytes of `SHA256(SHA256(version || hash))`.

use crate::error::{BlockchainError, Result};
use crate::utils::{base58_decode, base58_encode, ripemd160_digest, sha256_digest};

pub const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;
const VERSION_LEN: usize = 1;

pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(pub_key);
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = sha256_digest(payload);
    let second_sha = sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn derive_address(public_key: &[u8]) -> String {
    convert_address(hash_pub_key(public_key).as_slice())
}

/// Encode an already hashed public key as an address.
pub fn convert_address(pub_key_hash: &[u8]) -> String {
    let mut payload: Vec<u8> = Vec::with_capacity(VERSION_LEN + pub_key_hash.len() + ADDRESS_CHECK_SUM_LEN);
    payload.push(VERSION);
    payload.extend(pub_key_hash);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    // version + pub_key_hash + checksum
    base58_encode(payload.as_slice())
}

/// Check an address's embedded checksum.
///
/// Returns `Ok(false)` on a checksum mismatch, `Err(Decode)` for characters
/// outside the base58 alphabet and `Err(MalformedAddress)` when the decoded
/// payload cannot hold a version byte plus a checksum.
pub fn validate_address(address: &str) -> Result<bool> {
    let payload = base58_decode(address)?;
    if payload.len() < VERSION_LEN + ADDRESS_CHECK_SUM_LEN {
        return Err(BlockchainError::MalformedAddress(format!(
            "decoded payload is {} bytes, need at least {}",
            payload.len(),
            VERSION_LEN + ADDRESS_CHECK_SUM_LEN
        )));
    }

    let (versioned, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    Ok(actual_checksum == checksum(versioned).as_slice())
}

/// Boolean form of [`validate_address`] for callers that only need yes/no.
pub fn is_valid_address(address: &str) -> bool {
    match validate_address(address) {
        Ok(valid) => valid,
        Err(e) => {
            log::debug!("Rejecting address {address}: {e}");
            false
        }
    }
}

/// Validate an address and extract the public key hash it commits to.
pub fn pub_key_hash_from_address(address: &str) -> Result<Vec<u8>> {
    if !validate_address(address)? {
        return Err(BlockchainError::InvalidAddress(format!(
            "checksum mismatch for {address}"
        )));
    }
    let payload = base58_decode(address)?;
    Ok(payload[VERSION_LEN..payload.len() - ADDRESS_CHECK_SUM_LEN].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::KeyPair;

    // Bitcoin genesis coinbase address; same version byte and checksum scheme
    const KNOWN_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    #[test]
    fn test_known_address_validates() {
        assert!(validate_address(KNOWN_ADDRESS).unwrap());
    }

    #[test]
    fn test_derived_address_validates() {
        for _ in 0..5 {
            let key_pair = KeyPair::generate().unwrap();
            let address = derive_address(key_pair.get_public_key());
            assert!(address.starts_with('1'));
            assert!(validate_address(&address).unwrap());
        }
    }

    #[test]
    fn test_convert_address_matches_derive() {
        let key_pair = KeyPair::generate().unwrap();
        let hash = hash_pub_key(key_pair.get_public_key());
        assert_eq!(hash.len(), 20);
        assert_eq!(convert_address(&hash), derive_address(key_pair.get_public_key()));
        assert_eq!(pub_key_hash_from_address(&convert_address(&hash)).unwrap(), hash);
    }

    #[test]
    fn test_flipped_character_fails_checksum() {
        // Swap the last character for another base58 digit
        let mut chars: Vec<char> = KNOWN_ADDRESS.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'b' { 'c' } else { 'b' };
        let tampered: String = chars.into_iter().collect();
        assert!(!validate_address(&tampered).unwrap());
        assert!(!is_valid_address(&tampered));
    }

    #[test]
    fn test_out_of_alphabet_is_decode_error() {
        let result = validate_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7Divf0O");
        assert!(matches!(result, Err(BlockchainError::Decode(_))));
    }

    #[test]
    fn test_short_payload_is_malformed() {
        // "2" decodes to the single byte 0x01
        assert!(matches!(
            validate_address("2"),
            Err(BlockchainError::MalformedAddress(_))
        ));
        assert!(matches!(
            validate_address(""),
            Err(BlockchainError::MalformedAddress(_))
        ));
        assert!(!is_valid_address("2"));
    }

    #[test]
    fn test_pub_key_hash_rejects_bad_checksum() {
        let mut tampered = KNOWN_ADDRESS.to_string();
        tampered.pop();
        tampered.push('b');
        let result = pub_key_hash_from_address(&tampered);
        assert!(matches!(result, Err(BlockchainError::InvalidAddress(_))));
    }
}
