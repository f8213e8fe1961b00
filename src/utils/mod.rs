//! Utility functions and helpers
//!
//! Hashing, the base58 codec, P-256 ECDSA primitives and the binary
//! serialization helpers used throughout the crate.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_public_key,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    ripemd160_digest, sha256_digest,
};

pub use serialization::{deserialize, serialize};
