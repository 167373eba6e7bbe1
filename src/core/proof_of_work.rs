use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::{encode_i64, sha256_digest};
use data_encoding::HEXLOWER;
use log::debug;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;

pub const DEFAULT_DIFFICULTY: u32 = 12;
pub const MAX_DIFFICULTY: u32 = 255;
pub const MAX_NONCE: i64 = i64::MAX;

/// Mining parameters shared by every block of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowSettings {
    pub difficulty: u32,
    /// Exclusive upper bound of the nonce search.
    pub max_nonce: i64,
}

impl Default for PowSettings {
    fn default() -> Self {
        PowSettings {
            difficulty: DEFAULT_DIFFICULTY,
            max_nonce: MAX_NONCE,
        }
    }
}

impl PowSettings {
    pub fn new(difficulty: u32, max_nonce: i64) -> Result<PowSettings> {
        let settings = PowSettings {
            difficulty,
            max_nonce,
        };
        settings.check()?;
        Ok(settings)
    }

    pub fn check(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty {} exceeds maximum {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        if self.max_nonce <= 0 {
            return Err(LedgerError::Config(format!(
                "max_nonce must be positive, got {}",
                self.max_nonce
            )));
        }
        Ok(())
    }
}

/// Target threshold for a difficulty: `2^(256 - difficulty)`.
pub fn target(difficulty: u32) -> BigInt {
    let mut target = BigInt::from(1);
    target.shl_assign(256 - difficulty.min(MAX_DIFFICULTY));
    target
}

pub struct ProofOfWork {
    pre_block_hash: Vec<u8>,
    transactions_digest: Vec<u8>,
    target: BigInt,
    settings: PowSettings,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: &Block, settings: PowSettings) -> ProofOfWork {
        ProofOfWork {
            pre_block_hash: block.get_pre_block_hash().to_vec(),
            transactions_digest: block.hash_transactions(),
            target: target(settings.difficulty),
            settings,
        }
    }

    /// Recompute the hash from the block's stored nonce and check it against the target.
    pub fn validate(block: &Block, settings: PowSettings) -> bool {
        let pow = ProofOfWork::new_proof_of_work(block, settings);
        let hash = pow.hash_with_nonce(block.get_nonce());
        pow.meets_target(&hash)
    }

    /// Hash of the block content combined with `nonce`.
    pub fn hash_with_nonce(&self, nonce: i64) -> Vec<u8> {
        sha256_digest(self.prepare_data(nonce).as_slice())
    }

    fn meets_target(&self, hash: &[u8]) -> bool {
        BigInt::from_bytes_be(Sign::Plus, hash) < self.target
    }

    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data_bytes = Vec::with_capacity(
            self.pre_block_hash.len() + self.transactions_digest.len() + 16,
        );
        data_bytes.extend(&self.pre_block_hash);
        data_bytes.extend(&self.transactions_digest);
        data_bytes.extend(encode_i64(nonce));
        data_bytes.extend(encode_i64(i64::from(self.settings.difficulty)));
        data_bytes
    }

    /// Linear nonce search from zero. Fails once `max_nonce` is reached.
    pub fn run(&self) -> Result<(i64, Vec<u8>)> {
        debug!(
            "Mining the block (difficulty {}, nonce bound {})",
            self.settings.difficulty, self.settings.max_nonce
        );
        let mut nonce = 0;
        while nonce < self.settings.max_nonce {
            let hash = self.hash_with_nonce(nonce);
            if self.meets_target(&hash) {
                debug!("Found nonce {nonce}: {}", HEXLOWER.encode(&hash));
                return Ok((nonce, hash));
            }
            nonce += 1;
        }
        Err(LedgerError::MiningExhausted {
            max_nonce: self.settings.max_nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    fn settings(difficulty: u32) -> PowSettings {
        PowSettings::new(difficulty, MAX_NONCE).unwrap()
    }

    fn create_test_block(difficulty: u32) -> Block {
        let coinbase_tx = Transaction::new_coinbase_tx("alice", "").unwrap();
        Block::new_block(vec![], &[coinbase_tx], settings(difficulty)).unwrap()
    }

    #[test]
    fn test_target_is_power_of_two() {
        assert_eq!(target(0), BigInt::from(1) << 256u32);
        assert_eq!(target(12), BigInt::from(1) << 244u32);
        assert_eq!(target(255), BigInt::from(2));
    }

    #[test]
    fn test_higher_difficulty_means_smaller_target() {
        assert!(target(2) < target(1));
        assert!(target(20) < target(12));
    }

    #[test]
    fn test_mined_block_validates() {
        let block = create_test_block(8);
        assert!(ProofOfWork::validate(&block, settings(8)));
    }

    #[test]
    fn test_hash_matches_preimage() {
        let block = create_test_block(8);
        let mut preimage = block.get_pre_block_hash().to_vec();
        preimage.extend(block.hash_transactions());
        preimage.extend(block.get_nonce().to_be_bytes());
        preimage.extend(8i64.to_be_bytes());

        assert_eq!(sha256_digest(&preimage), block.get_hash());
    }

    #[test]
    fn test_mined_hash_has_leading_zero_bits() {
        let block = create_test_block(8);
        assert_eq!(block.get_hash()[0], 0);
    }

    #[test]
    fn test_zero_difficulty_accepts_first_nonce() {
        let block = create_test_block(0);
        assert_eq!(block.get_nonce(), 0);
    }

    #[test]
    fn test_validation_fails_under_other_difficulty() {
        // A nonce found for difficulty 1 almost never satisfies difficulty 40.
        let block = create_test_block(1);
        assert!(!ProofOfWork::validate(&block, settings(40)));
    }

    #[test]
    fn test_tampered_nonce_fails_validation() {
        let block = create_test_block(16);
        let tampered = block.with_nonce(block.get_nonce() + 1);
        assert!(!ProofOfWork::validate(&tampered, settings(16)));
    }

    #[test]
    fn test_run_exhausts_nonce_bound() {
        let block = create_test_block(0);
        let pow = ProofOfWork::new_proof_of_work(&block, PowSettings::new(64, 16).unwrap());

        assert_eq!(
            pow.run(),
            Err(LedgerError::MiningExhausted { max_nonce: 16 })
        );
    }

    #[test]
    fn test_prepare_data_consistency() {
        let block = create_test_block(2);
        let pow = ProofOfWork::new_proof_of_work(&block, settings(2));

        let data1 = pow.prepare_data(12345);
        let data2 = pow.prepare_data(12345);
        assert_eq!(data1, data2);
        assert_ne!(data1, pow.prepare_data(54321));
        // empty prev hash + 32 byte digest + nonce + difficulty
        assert_eq!(data1.len(), 32 + 8 + 8);
    }

    #[test]
    fn test_settings_reject_out_of_range_values() {
        assert!(matches!(
            PowSettings::new(256, 10),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(PowSettings::new(8, 0), Err(LedgerError::Config(_))));
    }
}
