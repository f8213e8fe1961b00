use crate::config::{GLOBAL_CONFIG, MAX_DIFFICULTY};
use crate::core::MiningControl;
use crate::core::mining::CHECK_INTERVAL;
use crate::error::{BlockchainError, Result};
use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;

/// The parts of a block the proof-of-work is computed over.
pub trait PowSubject {
    fn prev_block_hash(&self) -> &[u8];
    /// Deterministic digest of the block's transaction set.
    fn hash_transactions(&self) -> Vec<u8>;
    /// Nonce the block claims to have found.
    fn nonce(&self) -> i64;
}

/// A proof-of-work computation bound to one block for the duration of a
/// mining or validation call.
pub struct ProofOfWork<'a, B: PowSubject> {
    block: &'a B,
    transactions_digest: Vec<u8>,
    difficulty: usize,
    target_prefix: String,
}

impl<'a, B: PowSubject> ProofOfWork<'a, B> {
    /// Uses the configured difficulty.
    pub fn new_proof_of_work(block: &'a B) -> ProofOfWork<'a, B> {
        Self::with_difficulty(block, GLOBAL_CONFIG.get_difficulty())
    }

    pub fn with_difficulty(block: &'a B, difficulty: usize) -> ProofOfWork<'a, B> {
        ProofOfWork {
            block,
            transactions_digest: block.hash_transactions(),
            difficulty,
            target_prefix: "0".repeat(difficulty),
        }
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    /// `prev_block_hash || transactions_digest || decimal(nonce)`
    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let nonce = nonce.to_string();
        let prev_block_hash = self.block.prev_block_hash();
        let mut data_bytes = Vec::with_capacity(
            prev_block_hash.len() + self.transactions_digest.len() + nonce.len(),
        );
        data_bytes.extend(prev_block_hash);
        data_bytes.extend(self.transactions_digest.as_slice());
        data_bytes.extend(nonce.as_bytes());
        data_bytes
    }

    fn meets_target(&self, hash: &[u8]) -> bool {
        HEXLOWER.encode(hash).starts_with(self.target_prefix.as_str())
    }

    /// Search nonces upward from zero until the hash has `difficulty` leading
    /// zero hex digits. Returns the winning nonce and hash.
    ///
    /// `control` is polled every `CHECK_INTERVAL` nonces, starting before the
    /// first attempt. A difficulty above `MAX_DIFFICULTY` can never be met and
    /// is rejected up front.
    pub fn run(&self, control: &MiningControl) -> Result<(i64, Vec<u8>)> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Mining(format!(
                "difficulty {} exceeds the {MAX_DIFFICULTY} hex digits of a SHA256 hash",
                self.difficulty
            )));
        }
        log::info!("Mining the block with difficulty {}", self.difficulty);
        let mut nonce: i64 = 0;
        let mut attempts: u64 = 0;
        loop {
            if attempts % CHECK_INTERVAL == 0 {
                if let Err(e) = control.check(attempts) {
                    log::warn!("Proof-of-work interrupted: {e}");
                    return Err(e);
                }
            }

            let hash = sha256_digest(self.prepare_data(nonce).as_slice());
            attempts += 1;
            if self.meets_target(&hash) {
                log::info!(
                    "Found nonce {nonce} after {attempts} attempts: {}",
                    HEXLOWER.encode(&hash)
                );
                return Ok((nonce, hash));
            }

            nonce = nonce.checked_add(1).ok_or_else(|| {
                BlockchainError::Mining(format!("Nonce space exhausted after {attempts} attempts"))
            })?;
        }
    }

    /// Re-check the block's claimed nonce without searching.
    pub fn validate(&self) -> bool {
        let data = self.prepare_data(self.block.nonce());
        let hash = sha256_digest(data.as_slice());
        self.meets_target(&hash)
    }
}
