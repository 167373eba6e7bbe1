// Transactions move value with the UTXO model: inputs consume earlier outputs,
// outputs credit addresses. Addresses are plain strings and an input is authorized
// when its unlock proof equals the owner of the output it references.

use crate::error::{LedgerError, Result};
use crate::storage::UTXOSet;
use crate::utils::{deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::debug;
use serde::{Deserialize, Serialize};

/// Value credited to the genesis address.
pub const SUBSIDY: u64 = 100;

/// Output index carried by the single coinbase input.
pub const COINBASE_OUTPUT_INDEX: i64 = -1;

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXInput {
    referenced_tx_id: Vec<u8>,
    output_index: i64,
    unlock_proof: String,
}

impl TXInput {
    pub fn new(referenced_tx_id: &[u8], output_index: i64, unlock_proof: &str) -> TXInput {
        TXInput {
            referenced_tx_id: referenced_tx_id.to_vec(),
            output_index,
            unlock_proof: unlock_proof.to_string(),
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.referenced_tx_id.as_slice()
    }

    pub fn get_vout(&self) -> i64 {
        self.output_index
    }

    pub fn get_unlock_proof(&self) -> &str {
        self.unlock_proof.as_str()
    }

    pub fn can_unlock(&self, address: &str) -> bool {
        self.unlock_proof == address
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXOutput {
    value: u64,
    owner: String,
}

impl TXOutput {
    pub fn new(value: u64, owner: &str) -> TXOutput {
        TXOutput {
            value,
            owner: owner.to_string(),
        }
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_owner(&self) -> &str {
        self.owner.as_str()
    }

    pub fn is_locked_with_key(&self, address: &str) -> bool {
        self.owner == address
    }
}

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    /// Coinbase paying [`SUBSIDY`] to `to`. An empty memo becomes `"Coins to <to>"`.
    pub fn new_coinbase_tx(to: &str, memo: &str) -> Result<Transaction> {
        let memo = if memo.is_empty() {
            format!("Coins to {to}")
        } else {
            memo.to_string()
        };
        let tx_input = TXInput::new(&[], COINBASE_OUTPUT_INDEX, &memo);
        let txout = TXOutput::new(SUBSIDY, to);

        Transaction::from_parts(vec![tx_input], vec![txout])
    }

    /// Transfer `amount` from `from` to `to`, spending outputs in the order the
    /// scanner discovers them and returning any surplus to `from` as change.
    pub fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: u64,
        utxo_set: &UTXOSet,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(LedgerError::InvalidTransaction(
                "Amount must be positive".to_string(),
            ));
        }

        let (accumulated, valid_outputs) = utxo_set.find_spendable_outputs(from, amount)?;
        if accumulated < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = vec![];
        for (txid_hex, outs) in valid_outputs {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                LedgerError::InvalidTransaction(format!("Invalid transaction ID: {e}"))
            })?;
            for out in outs {
                let vout = i64::try_from(out).map_err(|_| {
                    LedgerError::InvalidTransaction(format!("Output index {out} out of range"))
                })?;
                inputs.push(TXInput::new(&txid, vout, from));
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)];
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, from)); // change
        }

        debug!(
            "Built transfer of {amount} from {from} to {to} using {} inputs",
            inputs.len()
        );
        Transaction::from_parts(inputs, outputs)
    }

    /// Assemble a transaction and assign its id.
    pub fn from_parts(vin: Vec<TXInput>, vout: Vec<TXOutput>) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            vin,
            vout,
        };
        tx.id = tx.hash()?;
        Ok(tx)
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1
            && self.vin[0].referenced_tx_id.is_empty()
            && self.vin[0].output_index == COINBASE_OUTPUT_INDEX
    }

    /// SHA-256 of the canonical encoding with the id left empty.
    pub fn hash(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(&tx_copy.serialize()?))
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn get_output_value(&self) -> Result<u64> {
        let mut total = 0u64;
        for vout in &self.vout {
            total = total.checked_add(vout.get_value()).ok_or_else(|| {
                LedgerError::InvalidTransaction("Output value overflow".to_string())
            })?;
        }
        Ok(total)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}
