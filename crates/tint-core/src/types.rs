//! Core ledger types: transactions, outpoints, unspent outputs.
//!
//! All amounts are integers in the ledger's smallest unit. Token amounts of a
//! colored output are carried in the same `value` field as native value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::TX_VERSION;
use crate::error::TransactionError;
use crate::script::Script;

/// A 32-byte hash value, used for transaction IDs.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct OutPoint {
    /// Transaction ID containing the referenced output.
    pub txid: Hash256,
    /// Index of the output within the transaction.
    pub index: u32,
}

impl OutPoint {
    pub fn new(txid: Hash256, index: u32) -> Self {
        Self { txid, index }
    }

    /// Fixed byte layout: txid bytes followed by the index, little-endian.
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(self.txid.as_bytes());
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A transaction input, spending a previous output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxInput {
    /// The outpoint being spent.
    pub previous_output: OutPoint,
    /// Unlocking data. Empty until the wallet signs.
    pub script_sig: Vec<u8>,
}

impl TxInput {
    /// An unsigned input spending `previous_output`.
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Vec::new(),
        }
    }
}

/// A transaction output, creating a new UTXO.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOutput {
    /// Amount in the smallest unit. For colored outputs this is the token amount.
    pub value: u64,
    /// Locking script, optionally color-tagged.
    pub script_pubkey: Script,
}

/// A transaction: ordered inputs and ordered outputs.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// An empty transaction at the current version.
    pub fn new() -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Compute the transaction ID.
    ///
    /// BLAKE3 over the bincode encoding with every `script_sig` cleared, so
    /// the ID is fixed before signing and unaffected by it.
    pub fn txid(&self) -> Result<Hash256, TransactionError> {
        let mut stripped = self.clone();
        for input in &mut stripped.inputs {
            input.script_sig.clear();
        }
        let encoded = bincode::encode_to_vec(&stripped, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(Hash256(blake3::hash(&encoded).into()))
    }

    /// Size in bytes of the canonical encoding, script_sigs included.
    pub fn encoded_size(&self) -> Result<usize, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map(|v| v.len())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Outpoint of this transaction's output at `index`.
    pub fn outpoint(&self, index: u32) -> Result<OutPoint, TransactionError> {
        Ok(OutPoint::new(self.txid()?, index))
    }
}

/// A spendable output as reported by a wallet backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    pub txid: Hash256,
    pub index: u32,
    pub script_pubkey: Script,
    pub amount: u64,
    /// Whether the creating transaction is final on the ledger.
    pub finalized: bool,
}

impl UnspentOutput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.index)
    }
}

/// A spent output described explicitly for signing, when the wallet does
/// not track its source transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PrevOutput {
    pub txid: Hash256,
    pub index: u32,
    pub script_pubkey: Script,
    pub amount: u64,
}

impl PrevOutput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.index)
    }
}

impl From<&UnspentOutput> for PrevOutput {
    fn from(utxo: &UnspentOutput) -> Self {
        Self {
            txid: utxo.txid,
            index: utxo.index,
            script_pubkey: utxo.script_pubkey.clone(),
            amount: utxo.amount,
        }
    }
}
