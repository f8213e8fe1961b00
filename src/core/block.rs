use crate::core::{MiningControl, PowSubject, ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use serde::{Deserialize, Serialize};

/// A minimal block: enough to run and check proof-of-work over a set of
/// transactions. Chaining and persistence live outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    timestamp: i64,
    prev_block_hash: Vec<u8>,
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
    nonce: i64,
}

impl Block {
    /// Assemble a block and mine it at `difficulty`.
    pub fn new_block(
        prev_block_hash: Vec<u8>,
        transactions: &[Transaction],
        difficulty: usize,
        control: &MiningControl,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(BlockchainError::Transaction(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        let mut block = Block {
            timestamp: current_timestamp()?,
            prev_block_hash,
            hash: vec![],
            transactions: transactions.to_vec(),
            nonce: 0,
        };

        info!(
            "Starting proof-of-work for block with {} transactions",
            block.transactions.len()
        );
        let (nonce, hash) = ProofOfWork::with_difficulty(&block, difficulty).run(control)?;
        block.nonce = nonce;
        block.hash = hash;
        info!("Proof-of-work completed for block: {}", block.get_hash_hex());

        Ok(block)
    }

    pub fn new_genesis_block(
        coinbase: &Transaction,
        difficulty: usize,
        control: &MiningControl,
    ) -> Result<Block> {
        Self::new_block(vec![], std::slice::from_ref(coinbase), difficulty, control)
    }

    /// Rebuild a block received from elsewhere, e.g. to validate its claimed nonce.
    pub fn from_parts(
        timestamp: i64,
        prev_block_hash: Vec<u8>,
        hash: Vec<u8>,
        transactions: Vec<Transaction>,
        nonce: i64,
    ) -> Block {
        Block {
            timestamp,
            prev_block_hash,
            hash,
            transactions,
            nonce,
        }
    }

    /// SHA256 over the concatenated transaction identifiers.
    pub fn hash_transactions(&self) -> Vec<u8> {
        let mut txhashs = vec![];
        for transaction in &self.transactions {
            txhashs.extend(transaction.get_id());
        }
        sha256_digest(txhashs.as_slice())
    }

    /// Every transaction in the block passes signature verification.
    pub fn verify_transactions(&self) -> Result<bool> {
        for tx in &self.transactions {
            if !tx.verify()? {
                log::warn!(
                    "Block contains an invalid transaction {}",
                    HEXLOWER.encode(tx.get_id())
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_prev_block_hash(&self) -> &[u8] {
        self.prev_block_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize(bytes)
    }
}

impl PowSubject for Block {
    fn prev_block_hash(&self) -> &[u8] {
        self.get_prev_block_hash()
    }

    fn hash_transactions(&self) -> Vec<u8> {
        Block::hash_transactions(self)
    }

    fn nonce(&self) -> i64 {
        self.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn coinbase() -> Transaction {
        let wallet = Wallet::new().unwrap();
        Transaction::new_coinbase_tx_with_reward(wallet.get_address(), 10).unwrap()
    }

    #[test]
    fn test_genesis_block_is_mined() {
        let block = Block::new_genesis_block(&coinbase(), 2, &MiningControl::new()).unwrap();
        assert!(block.get_prev_block_hash().is_empty());
        assert!(block.get_hash_hex().starts_with("00"));
        assert!(ProofOfWork::with_difficulty(&block, 2).validate());
    }

    #[test]
    fn test_empty_block_rejected() {
        let result = Block::new_block(vec![1, 2, 3], &[], 1, &MiningControl::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_transactions_depends_on_ids() {
        let a = coinbase();
        let b = coinbase();
        let block_ab = Block::from_parts(0, vec![], vec![], vec![a.clone(), b.clone()], 0);
        let block_ba = Block::from_parts(0, vec![], vec![], vec![b, a], 0);
        assert_eq!(block_ab.hash_transactions().len(), 32);
        assert_ne!(block_ab.hash_transactions(), block_ba.hash_transactions());
    }

    #[test]
    fn test_impossible_difficulty_fails_fast() {
        let result = Block::new_block(vec![], &[coinbase()], 65, &MiningControl::new());
        assert!(matches!(result, Err(BlockchainError::Mining(_))));
    }

    #[test]
    fn test_cancelled_mining_returns_error() {
        let control = MiningControl::new();
        control.cancel();
        let result = Block::new_block(vec![], &[coinbase()], 3, &control);
        assert!(matches!(result, Err(e) if e.is_interrupted()));
    }

    #[test]
    fn test_block_serialization() {
        let block = Block::new_genesis_block(&coinbase(), 1, &MiningControl::new()).unwrap();
        let bytes = block.serialize().unwrap();
        let decoded = Block::deserialize(&bytes).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.verify_transactions().unwrap());
    }
}
