//! # Keystone Chain - the integrity layer of my ledger
//!
//! This crate holds the three pieces of my ledger where a bug means broken
//! money: proof-of-work, the transaction signing protocol, and addresses.
//! Each one produces a value that has to be reproducible and tamper-evident.
//!
//! ## What's in here
//! - **Key pairs**: ECDSA P-256, public keys stored as raw `X || Y`
//! - **Addresses**: Bitcoin-style `base58(version || RIPEMD160(SHA256(key)) || checksum)`
//! - **Transactions**: identifier = SHA256 of {timestamp, from, to, value}, signed
//!   by the sender; coinbase transactions mint the subsidy and need no signature
//! - **Balance reservation**: a per-address running total plus a pending
//!   reservation, checked and updated under the wallet's lock
//! - **Proof-of-work**: leading-zero-hex-digit search that can be cancelled
//!
//! ## How I organized it
//! - `core/`: transactions, reservation, proof-of-work, blocks
//! - `wallet/`: key pairs, addresses, wallets and their funds
//! - `storage/`: the wallet repository (file or memory)
//! - `config/`: difficulty, subsidy and wallet file settings
//! - `utils/`: hashing, base58, ECDSA primitives, bincode helpers
//! - `cli/`: the command-line front end
//!
//! Chain storage, consensus between participants and a UTXO model are not
//! part of this crate.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, Settings, GLOBAL_CONFIG};
pub use crate::core::{
    refund, reserve_transfer, settle_transfer, Block, MiningControl, PowSubject, ProofOfWork,
    Transaction,
};
pub use error::{BlockchainError, Result};
pub use storage::{FileWalletRepository, MemoryWalletRepository, WalletRepository};
pub use utils::{base58_decode, base58_encode, current_timestamp, ripemd160_digest, sha256_digest};
pub use wallet::{
    derive_address, generate_key_pair, hash_pub_key, is_valid_address, validate_address, Funds,
    KeyPair, Wallet, Wallets, ADDRESS_CHECK_SUM_LEN,
};
