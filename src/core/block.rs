use crate::core::{PowSettings, ProofOfWork, Transaction};
use crate::error::{LedgerError, Result};
use crate::utils::{deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use serde::{Deserialize, Serialize};

// Field order is the stored layout: hash, transactions, prev hash, nonce.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Block {
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
    pre_block_hash: Vec<u8>, // empty for genesis
    nonce: i64,
}

impl Block {
    pub fn new_block(
        pre_block_hash: Vec<u8>,
        transactions: &[Transaction],
        settings: PowSettings,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidBlock(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        let mut block = Block {
            hash: vec![],
            transactions: transactions.to_vec(),
            pre_block_hash,
            nonce: 0,
        };

        let pow = ProofOfWork::new_proof_of_work(&block, settings);
        let (nonce, hash) = pow.run()?;
        block.nonce = nonce;
        block.hash = hash;
        info!(
            "Proof-of-work completed for block {} (nonce {nonce}, difficulty {})",
            HEXLOWER.encode(&block.hash),
            settings.difficulty
        );

        Ok(block)
    }

    pub fn generate_genesis_block(transaction: &Transaction, settings: PowSettings) -> Result<Block> {
        Block::new_block(vec![], &[transaction.clone()], settings)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_pre_block_hash(&self) -> &[u8] {
        self.pre_block_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn is_genesis(&self) -> bool {
        self.pre_block_hash.is_empty()
    }

    /// SHA-256 over the concatenated transaction ids, in block order.
    pub fn hash_transactions(&self) -> Vec<u8> {
        let mut txhashs = vec![];
        for transaction in &self.transactions {
            txhashs.extend(transaction.get_id());
        }

        sha256_digest(txhashs.as_slice())
    }

    /// Copy of this block with a different nonce (for testing only)
    #[cfg(test)]
    pub fn with_nonce(&self, nonce: i64) -> Block {
        Block {
            nonce,
            ..self.clone()
        }
    }
}
