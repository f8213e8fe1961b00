//! Storage
//!
//! Wallet persistence through the `WalletRepository` interface.

pub mod wallet_store;

pub use wallet_store::{FileWalletRepository, MemoryWalletRepository, WalletRepository};
