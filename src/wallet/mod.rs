//! Wallet management and cryptographic identity
//!
//! Key-pair generation, address derivation/validation and the per-wallet
//! funds bookkeeping used by balance reservation.

pub mod address;
pub mod keypair;
#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use address::{
    convert_address, derive_address, hash_pub_key, is_valid_address, pub_key_hash_from_address,
    validate_address, ADDRESS_CHECK_SUM_LEN, VERSION,
};
pub use keypair::{generate_key_pair, KeyPair, COORDINATE_LEN, PUBLIC_KEY_LEN};
pub use wallet::{Funds, OutstandingReservation, Wallet, WalletRecord};
pub use wallets::{WalletRecords, Wallets};
