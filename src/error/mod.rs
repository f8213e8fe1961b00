//! Error handling for the integrity layer
//!
//! Every cryptographic, encoding and reservation failure is returned as a
//! `BlockchainError`; nothing in the library aborts the process.

use thiserror::Error;

/// Result type alias for blockchain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    /// Random source or curve failure while creating a key pair
    #[error("Key generation error: {0}")]
    KeyGeneration(String),
    /// Signing or key loading failure
    #[error("Cryptographic error: {0}")]
    Crypto(String),
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
    /// Input outside the base58 alphabet
    #[error("Decode error: {0}")]
    Decode(String),
    /// Decoded address too short to hold a version byte and a checksum
    #[error("Malformed address: {0}")]
    MalformedAddress(String),
    /// Address decoded fine but its checksum does not match
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Malformed public key: {0}")]
    MalformedKey(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Mining error: {0}")]
    Mining(String),
    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },
    #[error("Mining deadline exceeded after {attempts} attempts")]
    MiningDeadline { attempts: u64 },
}

impl BlockchainError {
    /// True for the two ways a proof-of-work search can be interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            BlockchainError::MiningCancelled { .. } | BlockchainError::MiningDeadline { .. }
        )
    }
}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
