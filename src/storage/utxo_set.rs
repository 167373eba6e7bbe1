// Unspent outputs are derived on demand by replaying the whole chain, tip to
// genesis. Nothing is cached between calls.
//
// Spends are tracked per block: every input in a block is recorded before any
// output in that block is checked. A spend recorded in a block *older* than the
// output it references (impossible on a well-formed chain) is therefore seen too
// late and does not hide the output. Known fragility: the scan order is part of the
// observable result on malformed chains, so it must not change.
//
// Recording spends per transaction instead would let an output survive a spend
// placed later in the same block. Here that spend hides it.

use crate::core::{Blockchain, TXOutput, Transaction};
use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use log::debug;
use std::collections::HashMap;

/// A transaction holding at least one unspent output for the scanned address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentTransaction {
    pub transaction: Transaction,
    /// Indices of the outputs that are unspent and owned by the address, ascending.
    pub outputs: Vec<usize>,
}

impl UnspentTransaction {
    pub fn unspent_outputs(&self) -> impl Iterator<Item = (usize, &TXOutput)> + '_ {
        self.outputs
            .iter()
            .map(move |&idx| (idx, &self.transaction.get_vout()[idx]))
    }
}

pub struct UTXOSet {
    blockchain: Blockchain,
}

impl UTXOSet {
    pub fn new(blockchain: Blockchain) -> UTXOSet {
        UTXOSet { blockchain }
    }

    pub fn get_blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Transactions with outputs `address` can still spend, in chain visit order.
    pub fn find_unspent_transactions(&self, address: &str) -> Result<Vec<UnspentTransaction>> {
        let mut unspent_txs = vec![];
        // K -> txid_hex, V -> spent output indices
        let mut spent_txos: HashMap<String, Vec<i64>> = HashMap::new();

        for block in self.blockchain.iterator() {
            let block = block?;

            for tx in block.get_transactions() {
                if tx.is_coinbase() {
                    continue;
                }
                for txin in tx.get_vin() {
                    if txin.can_unlock(address) {
                        spent_txos
                            .entry(HEXLOWER.encode(txin.get_txid()))
                            .or_default()
                            .push(txin.get_vout());
                    }
                }
            }

            for tx in block.get_transactions() {
                let spent = spent_txos.get(&tx.get_id_hex());
                let outputs: Vec<usize> = tx
                    .get_vout()
                    .iter()
                    .enumerate()
                    .filter(|(idx, out)| {
                        let is_spent = spent.is_some_and(|indices| {
                            indices.iter().any(|&spent_idx| {
                                usize::try_from(spent_idx).is_ok_and(|i| i == *idx)
                            })
                        });
                        !is_spent && out.is_locked_with_key(address)
                    })
                    .map(|(idx, _)| idx)
                    .collect();

                if !outputs.is_empty() {
                    unspent_txs.push(UnspentTransaction {
                        transaction: tx.clone(),
                        outputs,
                    });
                }
            }
        }

        debug!(
            "Found {} transactions with unspent outputs for {address}",
            unspent_txs.len()
        );
        Ok(unspent_txs)
    }

    pub fn find_utxo(&self, address: &str) -> Result<Vec<TXOutput>> {
        let mut utxos = vec![];
        for unspent in self.find_unspent_transactions(address)? {
            for (_, out) in unspent.unspent_outputs() {
                utxos.push(out.clone());
            }
        }
        Ok(utxos)
    }

    /// Greedy first-found selection: outputs are taken in visit order until the
    /// running total reaches `amount`. Returns the total and, per transaction id
    /// (hex), the output indices used, in selection order.
    pub fn find_spendable_outputs(
        &self,
        address: &str,
        amount: u64,
    ) -> Result<(u64, Vec<(String, Vec<usize>)>)> {
        let mut unspent_outputs: Vec<(String, Vec<usize>)> = vec![];
        let mut accumulated = 0u64;

        'work: for unspent in self.find_unspent_transactions(address)? {
            let txid_hex = unspent.transaction.get_id_hex();
            for (idx, out) in unspent.unspent_outputs() {
                if accumulated >= amount {
                    break 'work;
                }
                accumulated = accumulated.saturating_add(out.get_value());
                match unspent_outputs.last_mut() {
                    Some((last_txid, indices)) if *last_txid == txid_hex => indices.push(idx),
                    _ => unspent_outputs.push((txid_hex.clone(), vec![idx])),
                }
            }
        }
        Ok((accumulated, unspent_outputs))
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        self.find_utxo(address)?
            .iter()
            .try_fold(0u64, |total, out| total.checked_add(out.get_value()))
            .ok_or_else(|| {
                LedgerError::InvalidTransaction(format!("Balance of {address} overflows u64"))
            })
    }
}
