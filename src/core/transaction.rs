// This file implements the transaction protocol: how a transfer is hashed, signed and verified.
// The identifier only ever covers {timestamp, from, to, value}, so the signature and the
// public key can be attached afterwards without changing it.

use crate::config::GLOBAL_CONFIG;
use crate::core::reservation;
use crate::error::{BlockchainError, Result};
use crate::utils::{
    current_timestamp, deserialize, ecdsa_p256_sha256_sign_verify, serialize, sha256_digest,
};
use crate::wallet::keypair::{sec1_from_coordinates, split_fixed_width};
use crate::wallet::{derive_address, validate_address, KeyPair, Wallet, Wallets};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

// The canonical record I hash to get a transaction's identifier
#[derive(bincode::Encode)]
struct HashTransaction {
    timestamp: i64,
    from: String,
    to: String,
    value: i64,
}

/// A value transfer between two addresses, or a coinbase mint when `from` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    timestamp: i64,
    from: String,
    to: String,
    value: i64,
    signature: Vec<u8>, // fixed-width r || s
    pub_key: Vec<u8>,   // sender's X || Y
}

fn require_valid_address(address: &str, role: &str) -> Result<()> {
    if !validate_address(address)? {
        return Err(BlockchainError::InvalidAddress(format!(
            "Invalid {role} address: {address}"
        )));
    }
    Ok(())
}

impl Transaction {
    // When I mint the configured subsidy to a miner
    pub fn new_coinbase_tx(to: &str) -> Result<Transaction> {
        Self::new_coinbase_tx_with_reward(to, GLOBAL_CONFIG.get_subsidy())
    }

    pub fn new_coinbase_tx_with_reward(to: &str, reward: i64) -> Result<Transaction> {
        if reward <= 0 {
            return Err(BlockchainError::Transaction(
                "Coinbase reward must be positive".to_string(),
            ));
        }
        require_valid_address(to, "recipient")?;

        let mut tx = Transaction {
            timestamp: current_timestamp()?,
            to: to.to_string(),
            value: reward,
            ..Default::default()
        };
        tx.id = tx.compute_identifier()?;
        Ok(tx)
    }

    /// Build and sign a transfer, reserving `amount` on both wallets first.
    ///
    /// The funds check and both reservations happen atomically; if signing then
    /// fails the reservations are released again.
    pub fn new_transfer(from: &Wallet, to: &Wallet, amount: i64) -> Result<Transaction> {
        reservation::reserve_transfer(from, to, amount)?;

        match Self::build_signed(from, to.get_address(), amount)
            .and_then(|tx| from.track_reservation(tx.get_id()).map(|_| tx))
        {
            Ok(tx) => {
                log::info!(
                    "Constructed transfer {} of {amount} from {} to {}",
                    HEXLOWER.encode(tx.get_id()),
                    from.get_address(),
                    to.get_address()
                );
                Ok(tx)
            }
            Err(e) => {
                log::error!("Construction failed, releasing reservation: {e}");
                reservation::release_transfer(from, to, amount)?;
                Err(e)
            }
        }
    }

    /// [`Transaction::new_transfer`] addressed by strings, looked up in `wallets`.
    pub fn new_transfer_between(
        wallets: &Wallets,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Result<Transaction> {
        require_valid_address(from, "sender")?;
        require_valid_address(to, "recipient")?;
        let from_wallet = wallets.require_wallet(from)?;
        let to_wallet = wallets.require_wallet(to)?;
        Self::new_transfer(&from_wallet, &to_wallet, amount)
    }

    fn build_signed(from: &Wallet, to: &str, amount: i64) -> Result<Transaction> {
        let mut tx = Transaction {
            timestamp: current_timestamp()?,
            from: from.get_address().to_string(),
            to: to.to_string(),
            value: amount,
            ..Default::default()
        };
        tx.id = tx.compute_identifier()?;
        tx.sign(from.key_pair())?;
        Ok(tx)
    }

    /// Undo the reservations this transfer placed, for a transaction discarded
    /// before settlement.
    pub fn refund(&self, wallets: &Wallets) -> Result<()> {
        reservation::refund(self, wallets)
    }

    /// SHA256 of the canonical {timestamp, from, to, value} encoding.
    pub fn compute_identifier(&self) -> Result<Vec<u8>> {
        let hash_tx = HashTransaction {
            timestamp: self.timestamp,
            from: self.from.clone(),
            to: self.to.clone(),
            value: self.value,
        };
        let encoded = serialize(&hash_tx)?;
        Ok(sha256_digest(&encoded))
    }

    /// Sign a transfer with the sender's key. Coinbase transactions are left untouched.
    ///
    /// Signing is one-way: a transaction that already carries a signature is
    /// rejected rather than re-signed.
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }
        if !self.signature.is_empty() {
            return Err(BlockchainError::Transaction(
                "Transaction is already signed; build a new one instead".to_string(),
            ));
        }
        if key_pair.get_address() != self.from {
            return Err(BlockchainError::Transaction(format!(
                "Signing key does not control sender address {}",
                self.from
            )));
        }

        self.pub_key = key_pair.get_public_key().to_vec();
        self.id = self.compute_identifier()?;
        self.signature = key_pair.sign(&self.id)?;
        log::debug!("Signed transaction {}", HEXLOWER.encode(&self.id));
        Ok(())
    }

    /// Check the signature of a transfer against its stored public key.
    ///
    /// Coinbase transactions always verify. `Ok(false)` means the transaction
    /// is invalid; `Err(MalformedSignature | MalformedKey)` means the stored
    /// bytes cannot even be split into their two components.
    pub fn verify(&self) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        if self.signature.is_empty() || self.pub_key.is_empty() {
            log::warn!("Transfer from {} is unsigned", self.from);
            return Ok(false);
        }

        // I split the stored bytes as they are, before anything else touches them
        let signature = split_fixed_width(&self.signature)
            .map_err(BlockchainError::MalformedSignature)?;
        let public_point = sec1_from_coordinates(&self.pub_key)?;

        let identifier = self.compute_identifier()?;
        if identifier != self.id {
            log::warn!(
                "Transaction {} does not match its recomputed identifier",
                HEXLOWER.encode(&self.id)
            );
            return Ok(false);
        }

        // The key has to be the one the sender address commits to
        if derive_address(&public_point[1..]) != self.from {
            log::warn!("Public key does not belong to sender {}", self.from);
            return Ok(false);
        }

        let valid = ecdsa_p256_sha256_sign_verify(&public_point, &signature, &identifier);
        if !valid {
            log::warn!(
                "Signature check failed for transaction {}",
                HEXLOWER.encode(&identifier)
            );
        }
        Ok(valid)
    }

    pub fn is_coinbase(&self) -> bool {
        self.from.is_empty()
    }

    pub fn is_signed(&self) -> bool {
        self.is_coinbase() || !self.signature.is_empty()
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_from(&self) -> &str {
        self.from.as_str()
    }

    pub fn get_to(&self) -> &str {
        self.to.as_str()
    }

    pub fn get_value(&self) -> i64 {
        self.value
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}
