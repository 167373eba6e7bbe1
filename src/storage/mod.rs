//! Chain-derived indexes
//!
//! Unspent-output queries answered by replaying the stored chain.

pub mod utxo_set;

pub use utxo_set::{UTXOSet, UnspentTransaction};
