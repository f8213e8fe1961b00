use crate::error::{BlockchainError, Result};
use crate::wallet::{Wallet, WalletRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Persisted wallet set, keyed by address.
pub type WalletRecords = HashMap<String, WalletRecord>;

/// The wallets known to this process, keyed by address.
#[derive(Debug, Default)]
pub struct Wallets {
    wallets: HashMap<String, Arc<Wallet>>,
}

impl Wallets {
    pub fn new() -> Wallets {
        Wallets {
            wallets: HashMap::new(),
        }
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = self.insert(wallet);
        log::info!("Created wallet {address}");
        Ok(address)
    }

    pub fn insert(&mut self, wallet: Wallet) -> String {
        let address = wallet.get_address().to_string();
        self.wallets.insert(address.clone(), Arc::new(wallet));
        address
    }

    /// Sorted so listings are stable between runs.
    pub fn get_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.wallets.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn get_wallet(&self, address: &str) -> Option<Arc<Wallet>> {
        self.wallets.get(address).cloned()
    }

    /// Like [`Wallets::get_wallet`] but a missing address is an error.
    pub fn require_wallet(&self, address: &str) -> Result<Arc<Wallet>> {
        self.get_wallet(address)
            .ok_or_else(|| BlockchainError::Wallet(format!("Wallet not found for address: {address}")))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn to_records(&self) -> Result<WalletRecords> {
        let mut records = HashMap::with_capacity(self.wallets.len());
        for (address, wallet) in &self.wallets {
            records.insert(address.clone(), wallet.to_record()?);
        }
        Ok(records)
    }

    pub fn from_records(records: &WalletRecords) -> Result<Wallets> {
        let mut wallets = Wallets::new();
        for (address, record) in records {
            let wallet = Wallet::from_record(record)?;
            if wallet.get_address() != address {
                return Err(BlockchainError::Wallet(format!(
                    "Stored key for {address} derives {}",
                    wallet.get_address()
                )));
            }
            wallets.insert(wallet);
        }
        Ok(wallets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let mut wallets = Wallets::new();
        assert!(wallets.is_empty());
        let address = wallets.create_wallet().unwrap();

        assert_eq!(wallets.len(), 1);
        let wallet = wallets.get_wallet(&address).unwrap();
        assert_eq!(wallet.get_address(), address);
        assert!(wallets.get_wallet("missing").is_none());
        assert!(matches!(
            wallets.require_wallet("missing"),
            Err(BlockchainError::Wallet(_))
        ));
    }

    #[test]
    fn test_addresses_are_sorted() {
        let mut wallets = Wallets::new();
        for _ in 0..4 {
            wallets.create_wallet().unwrap();
        }
        let addresses = wallets.get_addresses();
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }

    #[test]
    fn test_records_round_trip() {
        let mut wallets = Wallets::new();
        let address = wallets.create_wallet().unwrap();
        wallets.get_wallet(&address).unwrap().credit(3).unwrap();

        let records = wallets.to_records().unwrap();
        let restored = Wallets::from_records(&records).unwrap();
        assert_eq!(restored.get_addresses(), wallets.get_addresses());
        assert_eq!(restored.get_wallet(&address).unwrap().get_balance().unwrap(), 3);
    }

    #[test]
    fn test_from_records_rejects_mismatched_key() {
        let mut wallets = Wallets::new();
        let address = wallets.create_wallet().unwrap();
        let mut records = wallets.to_records().unwrap();
        let record = records.remove(&address).unwrap();
        records.insert("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa".to_string(), record);

        assert!(matches!(
            Wallets::from_records(&records),
            Err(BlockchainError::Wallet(_))
        ));
    }
}
