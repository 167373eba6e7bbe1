// The ledger store: blocks live in a sled tree keyed by their hash, next to a
// pointer key naming the current tip. A block and the tip update are always
// written in one sled transaction, so readers never see one without the other.

use crate::config::Config;
use crate::core::{Block, PowSettings, ProofOfWork, Transaction};
use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use log::{info, warn};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Db, Tree};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

const TIP_BLOCK_HASH_KEY: &[u8] = b"lh"; // hash of the latest block
const DIFFICULTY_KEY: &[u8] = b"difficulty"; // difficulty the chain is mined at
const BLOCKS_TREE: &str = "blocks";
const SLED_FILES: [&str; 2] = ["conf", "db"];

/// Memo carried by the genesis coinbase input.
pub const GENESIS_DATA: &str = "First transaction from genesis";

#[derive(Clone)]
pub struct Blockchain {
    tip_hash: Arc<RwLock<Vec<u8>>>,
    // Held across read-tip/mine/write so only one block is mined per tip.
    write_lock: Arc<Mutex<()>>,
    db: Db,
    blocks: Tree,
    db_path: PathBuf,
    settings: PowSettings,
}

impl Blockchain {
    /// Create a new chain at the configured location.
    pub fn create_blockchain(genesis_address: &str, config: &Config) -> Result<Blockchain> {
        Self::create_blockchain_with_path(genesis_address, &config.db_path, config.pow_settings())
    }

    /// Open the existing chain at the configured location.
    pub fn new_blockchain(config: &Config) -> Result<Blockchain> {
        Self::new_blockchain_with_path(&config.db_path, config.pow_settings())
    }

    pub fn create_blockchain_with_path<P: AsRef<Path>>(
        genesis_address: &str,
        db_path: P,
        settings: PowSettings,
    ) -> Result<Blockchain> {
        settings.check()?;
        let path = db_path.as_ref().to_path_buf();
        let (db, blocks) = Self::open_store(&path)?;

        if blocks.contains_key(TIP_BLOCK_HASH_KEY)? {
            return Err(LedgerError::AlreadyInitialized(path.display().to_string()));
        }

        info!("Creating genesis block for address: {genesis_address}");
        let coinbase_tx = Transaction::new_coinbase_tx(genesis_address, GENESIS_DATA)?;
        let genesis = Block::generate_genesis_block(&coinbase_tx, settings)?;
        let block_data = genesis.serialize()?;
        let difficulty = settings.difficulty.to_be_bytes();

        blocks
            .transaction(|tx_db| -> ConflictableTransactionResult<(), LedgerError> {
                tx_db.insert(genesis.get_hash(), block_data.as_slice())?;
                tx_db.insert(TIP_BLOCK_HASH_KEY, genesis.get_hash())?;
                tx_db.insert(DIFFICULTY_KEY, &difficulty[..])?;
                Ok(())
            })
            .map_err(Self::transaction_error)?;
        blocks.flush()?;
        info!("Genesis created: {}", genesis.get_hash_hex());

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(genesis.get_hash().to_vec())),
            write_lock: Arc::new(Mutex::new(())),
            db,
            blocks,
            db_path: path,
            settings,
        })
    }

    /// Reopen a chain. The difficulty stored with the chain takes precedence over
    /// `settings.difficulty` so existing blocks keep validating.
    pub fn new_blockchain_with_path<P: AsRef<Path>>(
        db_path: P,
        settings: PowSettings,
    ) -> Result<Blockchain> {
        settings.check()?;
        let path = db_path.as_ref().to_path_buf();
        if !Self::store_exists(&path) {
            return Err(LedgerError::NotInitialized(path.display().to_string()));
        }
        let (db, blocks) = Self::open_store(&path)?;

        let tip_hash = blocks
            .get(TIP_BLOCK_HASH_KEY)?
            .ok_or_else(|| LedgerError::NotInitialized(path.display().to_string()))?
            .to_vec();

        let mut settings = settings;
        if let Some(bytes) = blocks.get(DIFFICULTY_KEY)? {
            let raw: [u8; 4] = bytes.as_ref().try_into().map_err(|_| {
                LedgerError::Deserialization(format!(
                    "stored difficulty has {} bytes, expected 4",
                    bytes.len()
                ))
            })?;
            let stored = u32::from_be_bytes(raw);
            if stored != settings.difficulty {
                warn!(
                    "Configured difficulty {} ignored, chain was mined at {stored}",
                    settings.difficulty
                );
            }
            settings.difficulty = stored;
            settings.check()?;
        }

        info!(
            "Opened blockchain at {} with tip {}",
            path.display(),
            HEXLOWER.encode(&tip_hash)
        );
        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            write_lock: Arc::new(Mutex::new(())),
            db,
            blocks,
            db_path: path,
            settings,
        })
    }

    // sled writes both files when a database is first opened.
    fn store_exists(path: &Path) -> bool {
        SLED_FILES.iter().any(|name| path.join(name).is_file())
    }

    fn open_store(path: &Path) -> Result<(Db, Tree)> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::StorageIO(format!("Failed to open database: {e}")))?;
        let blocks = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::StorageIO(format!("Failed to open blocks tree: {e}")))?;
        Ok((db, blocks))
    }

    fn transaction_error(err: TransactionError<LedgerError>) -> LedgerError {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => {
                LedgerError::StorageIO(format!("Failed to update blocks tree: {e}"))
            }
        }
    }

    pub fn get_db(&self) -> &Db {
        &self.db
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn get_settings(&self) -> PowSettings {
        self.settings
    }

    pub fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self
            .tip_hash
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *tip_hash = new_tip_hash.to_vec();
    }

    fn read_stored_tip(&self) -> Result<Vec<u8>> {
        self.blocks
            .get(TIP_BLOCK_HASH_KEY)?
            .map(|tip| tip.to_vec())
            .ok_or_else(|| LedgerError::ChainCorrupted("tip pointer missing".to_string()))
    }

    /// Mine `transactions` on top of the current tip and commit the block.
    ///
    /// The stored tip is re-read under the write lock; the commit aborts without
    /// writing anything if the tip moved while mining.
    pub fn add_block(&self, transactions: &[Transaction]) -> Result<Block> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let last_hash = self.read_stored_tip()?;
        let block = Block::new_block(last_hash.clone(), transactions, self.settings)?;
        let block_data = block.serialize()?;

        self.blocks
            .transaction(|tx_db| -> ConflictableTransactionResult<(), LedgerError> {
                let current = tx_db.get(TIP_BLOCK_HASH_KEY)?;
                if current.as_deref() != Some(last_hash.as_slice()) {
                    return Err(ConflictableTransactionError::Abort(LedgerError::StorageIO(
                        "tip changed while the block was being mined".to_string(),
                    )));
                }
                tx_db.insert(block.get_hash(), block_data.as_slice())?;
                tx_db.insert(TIP_BLOCK_HASH_KEY, block.get_hash())?;
                Ok(())
            })
            .map_err(Self::transaction_error)?;
        self.blocks.flush()?;
        self.set_tip_hash(block.get_hash());

        info!(
            "Added block {} with {} transactions",
            block.get_hash_hex(),
            block.get_transactions().len()
        );
        Ok(block)
    }

    /// Run [`Blockchain::add_block`] on a dedicated worker thread.
    pub fn spawn_add_block(&self, transactions: Vec<Transaction>) -> JoinHandle<Result<Block>> {
        let blockchain = self.clone();
        thread::spawn(move || blockchain.add_block(&transactions))
    }

    pub fn iterator(&self) -> BlockchainIterator {
        BlockchainIterator::new(self.get_tip_hash(), self.blocks.clone())
    }

    pub fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        match self.blocks.get(block_hash)? {
            Some(bytes) => Ok(Some(Block::deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }

    pub fn find_transaction(&self, txid: &[u8]) -> Result<Option<Transaction>> {
        for block in self.iterator() {
            let block = block?;
            for transaction in block.get_transactions() {
                if txid.eq(transaction.get_id()) {
                    return Ok(Some(transaction.clone()));
                }
            }
        }
        Ok(None)
    }

    pub fn get_chain_length(&self) -> Result<usize> {
        let mut length = 0;
        for block in self.iterator() {
            block?;
            length += 1;
        }
        Ok(length)
    }

    /// Walk the whole chain checking proof-of-work and stored hashes.
    /// Returns the number of blocks.
    pub fn verify_chain(&self) -> Result<usize> {
        let mut length = 0;
        for block in self.iterator() {
            let block = block?;
            let pow = ProofOfWork::new_proof_of_work(&block, self.settings);
            if !ProofOfWork::validate(&block, self.settings)
                || pow.hash_with_nonce(block.get_nonce()) != block.get_hash()
            {
                return Err(LedgerError::InvalidBlock(format!(
                    "proof-of-work check failed for {}",
                    block.get_hash_hex()
                )));
            }
            if block.get_transactions().is_empty() {
                return Err(LedgerError::InvalidBlock(format!(
                    "block {} has no transactions",
                    block.get_hash_hex()
                )));
            }
            length += 1;
        }
        Ok(length)
    }
}

/// Cursor walking from a tip back to genesis.
///
/// Yields each block once and stops after the block with an empty previous
/// hash. A lookup or decoding failure is yielded once and ends the walk.
pub struct BlockchainIterator {
    blocks: Tree,
    current_hash: Option<Vec<u8>>,
}

impl BlockchainIterator {
    fn new(tip_hash: Vec<u8>, blocks: Tree) -> BlockchainIterator {
        BlockchainIterator {
            blocks,
            current_hash: Some(tip_hash),
        }
    }

    /// Restart the walk from `tip_hash`.
    pub fn reset(&mut self, tip_hash: &[u8]) {
        self.current_hash = Some(tip_hash.to_vec());
    }

    fn load(&self, hash: &[u8]) -> Result<Block> {
        let data = self.blocks.get(hash)?.ok_or_else(|| {
            LedgerError::ChainCorrupted(format!(
                "block {} is referenced but not stored",
                HEXLOWER.encode(hash)
            ))
        })?;
        Block::deserialize(data.as_ref())
    }
}

impl Iterator for BlockchainIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let current_hash = self.current_hash.take()?;
        match self.load(&current_hash) {
            Ok(block) => {
                if !block.is_genesis() {
                    self.current_hash = Some(block.get_pre_block_hash().to_vec());
                }
                Some(Ok(block))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
