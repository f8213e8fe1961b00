use crate::error::{BlockchainError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub const DEFAULT_DIFFICULTY: usize = 3;
pub const DEFAULT_SUBSIDY: i64 = 10;
pub const DEFAULT_WALLET_FILE: &str = "wallet.dat";

/// A SHA256 digest renders as 64 hex digits.
pub const MAX_DIFFICULTY: usize = 64;

const DIFFICULTY_KEY: &str = "KEYSTONE_DIFFICULTY";
const SUBSIDY_KEY: &str = "KEYSTONE_SUBSIDY";
const WALLET_FILE_KEY: &str = "KEYSTONE_WALLET_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Required number of leading '0' hex digits in a block hash
    pub difficulty: usize,
    /// Units minted by a coinbase transaction
    pub subsidy: i64,
    pub wallet_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            difficulty: DEFAULT_DIFFICULTY,
            subsidy: DEFAULT_SUBSIDY,
            wallet_file: PathBuf::from(DEFAULT_WALLET_FILE),
        }
    }
}

impl Settings {
    /// Parse settings from TOML; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_file(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply `KEYSTONE_*` environment overrides on top of these settings.
    pub fn with_env_overrides(mut self) -> Result<Settings> {
        if let Ok(value) = env::var(DIFFICULTY_KEY) {
            self.difficulty = value.trim().parse().map_err(|e| {
                BlockchainError::Config(format!("{DIFFICULTY_KEY}={value}: {e}"))
            })?;
        }
        if let Ok(value) = env::var(SUBSIDY_KEY) {
            self.subsidy = value
                .trim()
                .parse()
                .map_err(|e| BlockchainError::Config(format!("{SUBSIDY_KEY}={value}: {e}")))?;
        }
        if let Ok(value) = env::var(WALLET_FILE_KEY) {
            self.wallet_file = PathBuf::from(value);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty {} exceeds the {MAX_DIFFICULTY} hex digits of a SHA256 hash",
                self.difficulty
            )));
        }
        if self.subsidy <= 0 {
            return Err(BlockchainError::Config(format!(
                "subsidy must be positive, got {}",
                self.subsidy
            )));
        }
        Ok(())
    }
}

pub struct Config {
    inner: RwLock<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Build the process configuration from defaults and the environment.
    /// Invalid overrides are logged and ignored so a bad variable never
    /// takes the process down.
    pub fn new() -> Config {
        let settings = Settings::default()
            .with_env_overrides()
            .unwrap_or_else(|e| {
                log::warn!("Ignoring environment configuration: {e}");
                Settings::default()
            });
        Config::from_settings(settings)
    }

    pub fn from_settings(settings: Settings) -> Config {
        Config {
            inner: RwLock::new(settings),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        // Settings is plain data, so a poisoned lock still holds a usable value.
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *inner = settings;
        Ok(())
    }

    pub fn get_difficulty(&self) -> usize {
        self.settings().difficulty
    }

    pub fn get_subsidy(&self) -> i64 {
        self.settings().subsidy
    }

    pub fn get_wallet_file(&self) -> PathBuf {
        self.settings().wallet_file
    }
}
