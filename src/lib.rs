//! # Hashlink Ledger
//!
//! A single-node, append-only ledger: a hash-linked chain of proof-of-work
//! blocks carrying UTXO transactions, persisted in an embedded sled database.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the stored chain and proof-of-work
//! - `storage/`: unspent-output queries derived by replaying the chain
//! - `config/`: database location and mining parameters
//! - `utils/`: hashing and the canonical binary encoding
//! - `cli/`: argument parsing for the binary
//!
//! Addresses are opaque strings. An input may spend an output when its unlock
//! proof equals the output's owner; there are no keys or signatures.
//!
//! ```no_run
//! use hashlink_ledger::{Blockchain, Config, Transaction, UTXOSet};
//!
//! # fn main() -> hashlink_ledger::Result<()> {
//! let config = Config::load(None)?;
//! let chain = Blockchain::create_blockchain("alice", &config)?;
//! let utxo_set = UTXOSet::new(chain.clone());
//! let tx = Transaction::new_utxo_transaction("alice", "bob", 30, &utxo_set)?;
//! chain.add_block(&[tx])?;
//! assert_eq!(utxo_set.get_balance("bob")?, 30);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    Block, Blockchain, BlockchainIterator, PowSettings, ProofOfWork, TXInput, TXOutput,
    Transaction, SUBSIDY,
};
pub use error::{LedgerError, Result};
pub use storage::{UTXOSet, UnspentTransaction};
pub use utils::{deserialize, serialize, sha256_digest};
