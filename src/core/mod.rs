//! Core ledger functionality
//!
//! Blocks, transactions, the sled-backed chain and proof-of-work consensus.

pub mod block;
pub mod blockchain;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use blockchain::{Blockchain, BlockchainIterator, GENESIS_DATA};
pub use proof_of_work::{PowSettings, ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MAX_NONCE};
pub use transaction::{TXInput, TXOutput, Transaction, COINBASE_OUTPUT_INDEX, SUBSIDY};
