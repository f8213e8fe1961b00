use crate::error::{BlockchainError, Result};
use crate::wallet::KeyPair;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Confirmed balance plus the net pending reservation.
///
/// A positive reservation of `amount` lowers `blocked` (funds held back from
/// the sender); a negative one raises it (funds tentatively credited).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Funds {
    pub balance: i64,
    pub blocked: i64,
}

impl Funds {
    pub fn new(balance: i64, blocked: i64) -> Funds {
        Funds { balance, blocked }
    }

    pub fn spendable(&self) -> i64 {
        self.balance.saturating_add(self.blocked)
    }

    /// Funds after reserving `amount`; the receiver side passes a negative amount.
    pub fn reserved(self, amount: i64) -> Result<Funds> {
        let blocked = self
            .blocked
            .checked_sub(amount)
            .ok_or_else(|| BlockchainError::Wallet("Reservation overflow".to_string()))?;
        Ok(Funds { blocked, ..self })
    }

    /// Funds after a settled transfer moves `delta` into the confirmed balance and
    /// releases the matching reservation.
    pub fn settled(self, delta: i64) -> Result<Funds> {
        let overflow = || BlockchainError::Wallet("Settlement overflow".to_string());
        let balance = self.balance.checked_add(delta).ok_or_else(overflow)?;
        let blocked = self.blocked.checked_sub(delta).ok_or_else(overflow)?;
        Ok(Funds { balance, blocked })
    }
}

/// One key pair and the funds bookkeeping of the address it controls.
///
/// Funds sit behind a mutex so the spendable check and the reservation that
/// follows it happen under one lock. As a sender the wallet also counts the
/// transfers whose reservation is still outstanding, keyed by transaction id;
/// identical transfers built in the same second share an id, hence the count.
#[derive(Debug)]
pub struct Wallet {
    address: String,
    key_pair: KeyPair,
    funds: Mutex<Funds>,
    outstanding: Mutex<BTreeMap<Vec<u8>, u32>>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let key_pair = KeyPair::generate()?;
        Ok(Self::from_key_pair(key_pair, Funds::default()))
    }

    pub fn from_key_pair(key_pair: KeyPair, funds: Funds) -> Wallet {
        let address = key_pair.get_address();
        Wallet {
            address,
            key_pair,
            funds: Mutex::new(funds),
            outstanding: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.key_pair.get_public_key()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub(crate) fn lock_funds(&self) -> Result<MutexGuard<'_, Funds>> {
        self.funds
            .lock()
            .map_err(|_| BlockchainError::Wallet(format!("Funds lock poisoned for {}", self.address)))
    }

    /// Snapshot of the current funds.
    pub fn funds(&self) -> Result<Funds> {
        Ok(*self.lock_funds()?)
    }

    pub fn get_balance(&self) -> Result<i64> {
        Ok(self.funds()?.balance)
    }

    pub fn get_blocked(&self) -> Result<i64> {
        Ok(self.funds()?.blocked)
    }

    pub fn spendable(&self) -> Result<i64> {
        Ok(self.funds()?.spendable())
    }

    /// Apply a single reservation to this wallet without any funds check.
    pub fn reserve(&self, amount: i64) -> Result<()> {
        let mut funds = self.lock_funds()?;
        *funds = funds.reserved(amount)?;
        Ok(())
    }

    /// Credit confirmed balance, e.g. when a mined coinbase pays this address.
    pub fn credit(&self, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Err(BlockchainError::Wallet(format!(
                "Credit must be positive, got {amount}"
            )));
        }
        let mut funds = self.lock_funds()?;
        funds.balance = funds
            .balance
            .checked_add(amount)
            .ok_or_else(|| BlockchainError::Wallet("Balance overflow".to_string()))?;
        Ok(())
    }

    fn lock_outstanding(&self) -> Result<MutexGuard<'_, BTreeMap<Vec<u8>, u32>>> {
        self.outstanding.lock().map_err(|_| {
            BlockchainError::Wallet(format!("Reservation lock poisoned for {}", self.address))
        })
    }

    /// Record that transfer `tx_id` from this wallet holds a reservation.
    pub(crate) fn track_reservation(&self, tx_id: &[u8]) -> Result<()> {
        let mut outstanding = self.lock_outstanding()?;
        let count = outstanding.entry(tx_id.to_vec()).or_insert(0);
        *count = count
            .checked_add(1)
            .ok_or_else(|| BlockchainError::Wallet("Reservation count overflow".to_string()))?;
        Ok(())
    }

    /// Consume one outstanding reservation of `tx_id`. Fails when none is left,
    /// e.g. after a refund or settlement already used it.
    pub(crate) fn take_reservation(&self, tx_id: &[u8]) -> Result<()> {
        let mut outstanding = self.lock_outstanding()?;
        match outstanding.get_mut(tx_id) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                outstanding.remove(tx_id);
            }
            None => {
                return Err(BlockchainError::Transaction(format!(
                    "No outstanding reservation for transaction {} from {}",
                    data_encoding::HEXLOWER.encode(tx_id),
                    self.address
                )))
            }
        }
        Ok(())
    }

    /// Number of sent transfers still holding a reservation.
    pub fn outstanding_reservations(&self) -> Result<usize> {
        Ok(self
            .lock_outstanding()?
            .values()
            .map(|count| *count as usize)
            .sum())
    }

    pub fn to_record(&self) -> Result<WalletRecord> {
        let funds = self.funds()?;
        let outstanding = self
            .lock_outstanding()?
            .iter()
            .map(|(tx_id, count)| OutstandingReservation {
                tx_id: tx_id.clone(),
                count: *count,
            })
            .collect();
        Ok(WalletRecord {
            pkcs8: self.key_pair.get_pkcs8().to_vec(),
            public_key: self.key_pair.get_public_key().to_vec(),
            balance: funds.balance,
            blocked: funds.blocked,
            outstanding,
        })
    }

    pub fn from_record(record: &WalletRecord) -> Result<Wallet> {
        let key_pair = KeyPair::from_parts(record.pkcs8.clone(), &record.public_key)?;
        let wallet = Self::from_key_pair(key_pair, Funds::new(record.balance, record.blocked));
        {
            let mut outstanding = wallet.lock_outstanding()?;
            for entry in &record.outstanding {
                outstanding.insert(entry.tx_id.clone(), entry.count);
            }
        }
        Ok(wallet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct OutstandingReservation {
    tx_id: Vec<u8>,
    count: u32,
}

/// Persisted form of a wallet: private key, public key bytes, balance,
/// blocked amount and the sent transfers still holding a reservation.
#[derive(Zeroize, ZeroizeOnDrop, bincode::Encode, bincode::Decode)]
pub struct WalletRecord {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
    balance: i64,
    blocked: i64,
    #[zeroize(skip)]
    outstanding: Vec<OutstandingReservation>,
}

impl WalletRecord {
    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }
}
