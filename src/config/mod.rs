//! Configuration management
//!
//! Mining difficulty, coinbase subsidy and the wallet file location.
//! Defaults can be overridden by a TOML file and then by environment variables.

pub mod settings;

pub use settings::{
    Config, Settings, DEFAULT_DIFFICULTY, DEFAULT_SUBSIDY, DEFAULT_WALLET_FILE, GLOBAL_CONFIG,
    MAX_DIFFICULTY,
};
