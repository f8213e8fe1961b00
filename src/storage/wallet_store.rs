// Wallet persistence behind an explicit repository interface, so callers get
// their wallet set injected instead of reading a global file.

use crate::config::GLOBAL_CONFIG;
use crate::error::{BlockchainError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::{WalletRecords, Wallets};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait WalletRepository {
    fn load(&self) -> Result<Wallets>;
    fn save(&self, wallets: &Wallets) -> Result<()>;
}

fn encode_wallets(wallets: &Wallets) -> Result<Vec<u8>> {
    let records = wallets.to_records()?;
    serialize(&records)
}

fn decode_wallets(bytes: &[u8]) -> Result<Wallets> {
    let records: WalletRecords = deserialize(bytes)?;
    Wallets::from_records(&records)
}

/// Wallet set stored as one bincode file.
pub struct FileWalletRepository {
    path: PathBuf,
}

impl FileWalletRepository {
    pub fn new(path: impl Into<PathBuf>) -> FileWalletRepository {
        FileWalletRepository { path: path.into() }
    }

    /// Repository at the configured `wallet_file`.
    pub fn from_config() -> FileWalletRepository {
        Self::new(GLOBAL_CONFIG.get_wallet_file())
    }

    pub fn get_path(&self) -> &Path {
        self.path.as_path()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl WalletRepository for FileWalletRepository {
    /// A missing file is an empty wallet set; a corrupt one is an error.
    fn load(&self) -> Result<Wallets> {
        if !self.path.exists() {
            log::info!(
                "No wallet file at {}, starting with an empty set",
                self.path.display()
            );
            return Ok(Wallets::new());
        }

        let mut file = File::open(&self.path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        let wallets = decode_wallets(&buf).map_err(|e| {
            BlockchainError::Serialization(format!(
                "Could not read wallets from {}: {e}",
                self.path.display()
            ))
        })?;
        log::debug!("Loaded {} wallets from {}", wallets.len(), self.path.display());
        Ok(wallets)
    }

    fn save(&self, wallets: &Wallets) -> Result<()> {
        let bytes = encode_wallets(wallets)?;
        let temp_path = self.temp_path();
        {
            let file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes.as_slice())?;
            writer.flush()?;
        }
        // Replace in one step so a crash never leaves a half-written wallet file
        fs::rename(&temp_path, &self.path)?;
        log::debug!("Saved {} wallets to {}", wallets.len(), self.path.display());
        Ok(())
    }
}

/// Keeps the encoded wallet set in memory; used by tests and embedders.
#[derive(Default)]
pub struct MemoryWalletRepository {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryWalletRepository {
    pub fn new() -> MemoryWalletRepository {
        Self::default()
    }
}

impl WalletRepository for MemoryWalletRepository {
    fn load(&self) -> Result<Wallets> {
        let bytes = self
            .bytes
            .lock()
            .map_err(|_| BlockchainError::Wallet("Wallet store lock poisoned".to_string()))?;
        match bytes.as_deref() {
            Some(bytes) => decode_wallets(bytes),
            None => Ok(Wallets::new()),
        }
    }

    fn save(&self, wallets: &Wallets) -> Result<()> {
        let encoded = encode_wallets(wallets)?;
        let mut bytes = self
            .bytes
            .lock()
            .map_err(|_| BlockchainError::Wallet("Wallet store lock poisoned".to_string()))?;
        *bytes = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let repo = FileWalletRepository::new(dir.path().join("wallet.dat"));
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_save_and_load() {
        let dir = tempdir().unwrap();
        let repo = FileWalletRepository::new(dir.path().join("wallet.dat"));

        let mut wallets = Wallets::new();
        let address = wallets.create_wallet().unwrap();
        let wallet = wallets.get_wallet(&address).unwrap();
        wallet.credit(10).unwrap();
        wallet.reserve(4).unwrap();
        repo.save(&wallets).unwrap();

        assert!(repo.get_path().exists());
        assert!(!repo.temp_path().exists());

        let loaded = repo.load().unwrap();
        let restored = loaded.get_wallet(&address).unwrap();
        assert_eq!(restored.get_balance().unwrap(), 10);
        assert_eq!(restored.get_blocked().unwrap(), -4);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");
        fs::write(&path, [0xFF, 0xFF, 0xFF]).unwrap();

        let repo = FileWalletRepository::new(path);
        assert!(matches!(
            repo.load(),
            Err(BlockchainError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_repository() {
        let repo = MemoryWalletRepository::new();
        assert!(repo.load().unwrap().is_empty());

        let mut wallets = Wallets::new();
        wallets.create_wallet().unwrap();
        wallets.create_wallet().unwrap();
        repo.save(&wallets).unwrap();

        assert_eq!(repo.load().unwrap().get_addresses(), wallets.get_addresses());
    }
}
