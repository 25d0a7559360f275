//! In-memory reference wallet backend.
//!
//! [`MemoryWallet`] owns a [`KeyChain`], tracks unspent outputs in the order
//! they were credited, and signs with Ed25519. It has no persistence and no
//! chain connection: callers feed it transactions through
//! [`credit`](MemoryWallet::credit) and [`apply`](MemoryWallet::apply).

use parking_lot::RwLock;
use tint_core::color::ColorIdentifier;
use tint_core::crypto::sign_input;
use tint_core::error::BackendError;
use tint_core::script::Script;
use tint_core::traits::WalletBackend;
use tint_core::types::{PrevOutput, Transaction, UnspentOutput};
use tracing::debug;

use crate::coin_selection::{CoinSelector, ColorFilter};
use crate::error::WalletError;
use crate::keys::{KeyChain, Seed};

struct Inner {
    keychain: KeyChain,
    receive: Script,
    /// Owned unspent outputs, oldest credit first.
    utxos: Vec<UnspentOutput>,
    loaded: bool,
}

/// Wallet backed by a seed and an in-memory UTXO list.
///
/// The receive script is fixed (key index 0) so reissuable colors derived
/// from it stay stable; every change script is a fresh key.
pub struct MemoryWallet {
    id: String,
    inner: RwLock<Inner>,
}

impl MemoryWallet {
    /// Create a wallet with a random seed.
    pub fn create(id: impl Into<String>) -> Self {
        Self::from_seed(id, Seed::generate())
    }

    pub fn from_seed(id: impl Into<String>, seed: Seed) -> Self {
        let mut keychain = KeyChain::new(seed);
        let receive = keychain.script_at(0);
        Self {
            id: id.into(),
            inner: RwLock::new(Inner {
                keychain,
                receive,
                utxos: Vec::new(),
                loaded: true,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stop serving requests until [`load`](Self::load) is called.
    pub fn unload(&self) {
        self.inner.write().loaded = false;
    }

    pub fn load(&self) {
        self.inner.write().loaded = true;
    }

    /// Record every output of `tx` paying to one of this wallet's keys.
    ///
    /// Returns how many outputs were added. Outputs already tracked are skipped.
    pub fn credit(&self, tx: &Transaction, finalized: bool) -> Result<usize, BackendError> {
        let txid = tx.txid()?;
        let mut inner = self.inner.write();
        let mut added = 0;
        for (index, output) in tx.outputs.iter().enumerate() {
            let index = index as u32;
            if !inner.keychain.owns(&output.script_pubkey)
                || inner.utxos.iter().any(|u| u.txid == txid && u.index == index)
            {
                continue;
            }
            inner.utxos.push(UnspentOutput {
                txid,
                index,
                script_pubkey: output.script_pubkey.clone(),
                amount: output.value,
                finalized,
            });
            added += 1;
        }
        debug!(wallet = %self.id, %txid, added, "credited outputs");
        Ok(added)
    }

    /// Remove outputs spent by `tx`, then credit its outputs.
    pub fn apply(&self, tx: &Transaction, finalized: bool) -> Result<usize, BackendError> {
        {
            let mut inner = self.inner.write();
            inner.utxos.retain(|u| {
                !tx.inputs
                    .iter()
                    .any(|i| i.previous_output == u.outpoint())
            });
        }
        self.credit(tx, finalized)
    }

    /// Mark every tracked output as finalized.
    pub fn finalize_all(&self) {
        for utxo in &mut self.inner.write().utxos {
            utxo.finalized = true;
        }
    }

    /// Plain value held.
    pub fn balance(&self, only_finalized: bool) -> Result<u64, WalletError> {
        let utxos = self.list_unspent(only_finalized)?;
        CoinSelector::balance(&utxos, &ColorFilter::Uncolored)
    }

    /// Amount held of `color_id`.
    pub fn token_balance(
        &self,
        color_id: &ColorIdentifier,
        only_finalized: bool,
    ) -> Result<u64, WalletError> {
        let utxos = self.list_unspent(only_finalized)?;
        CoinSelector::balance(&utxos, &ColorFilter::Colored(*color_id))
    }

    fn ensure_loaded(&self, inner: &Inner) -> Result<(), BackendError> {
        if inner.loaded {
            Ok(())
        } else {
            Err(BackendError::WalletUnloaded(self.id.clone()))
        }
    }
}

impl WalletBackend for MemoryWallet {
    fn list_unspent(&self, only_finalized: bool) -> Result<Vec<UnspentOutput>, BackendError> {
        let inner = self.inner.read();
        self.ensure_loaded(&inner)?;
        Ok(inner
            .utxos
            .iter()
            .filter(|u| u.finalized || !only_finalized)
            .cloned()
            .collect())
    }

    fn receive_address(&self) -> Result<Script, BackendError> {
        let inner = self.inner.read();
        self.ensure_loaded(&inner)?;
        Ok(inner.receive.clone())
    }

    fn change_address(&self) -> Result<Script, BackendError> {
        let mut inner = self.inner.write();
        self.ensure_loaded(&inner)?;
        Ok(inner.keychain.next_script())
    }

    fn sign_tx(
        &self,
        mut tx: Transaction,
        prev_outputs: &[PrevOutput],
    ) -> Result<Transaction, BackendError> {
        let inner = self.inner.read();
        self.ensure_loaded(&inner)?;

        for i in 0..tx.inputs.len() {
            let outpoint = tx.inputs[i].previous_output;
            let (script, amount) = prev_outputs
                .iter()
                .find(|p| p.outpoint() == outpoint)
                .map(|p| (p.script_pubkey.clone(), p.amount))
                .or_else(|| {
                    inner
                        .utxos
                        .iter()
                        .find(|u| u.outpoint() == outpoint)
                        .map(|u| (u.script_pubkey.clone(), u.amount))
                })
                .ok_or_else(|| BackendError::MissingPrevOutput(outpoint.to_string()))?;

            let hash = script
                .pubkey_hash()
                .ok_or_else(|| BackendError::UnsupportedScript(script.to_hex()))?;
            let keypair = inner
                .keychain
                .keypair_for_pubkey_hash(&hash)
                .ok_or_else(|| BackendError::KeyNotFound(hex::encode(hash)))?;

            sign_input(&mut tx, i, &script, amount, keypair)?;
        }

        debug!(wallet = %self.id, inputs = tx.inputs.len(), "signed transaction");
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_core::crypto::verify_input;
    use tint_core::types::{Hash256, OutPoint, TxInput, TxOutput};

    fn wallet(seed: u8) -> MemoryWallet {
        MemoryWallet::from_seed(format!("w{seed}"), Seed::from_bytes([seed; 32]))
    }

    /// A transaction from nowhere paying `values` to `script`.
    fn deposit(script: &Script, values: &[u64], nonce: u8) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput::new(OutPoint::new(Hash256([nonce; 32]), 0))],
            outputs: values
                .iter()
                .map(|&value| TxOutput {
                    value,
                    script_pubkey: script.clone(),
                })
                .collect(),
            lock_time: 0,
        }
    }

    #[test]
    fn receive_address_is_stable() {
        let w = wallet(1);
        assert_eq!(w.receive_address().unwrap(), w.receive_address().unwrap());
    }

    #[test]
    fn change_addresses_are_fresh() {
        let w = wallet(1);
        let a = w.change_address().unwrap();
        let b = w.change_address().unwrap();
        assert_ne!(a, b);
        assert_ne!(a, w.receive_address().unwrap());
    }

    #[test]
    fn same_seed_same_receive_address() {
        assert_eq!(wallet(2).receive_address().unwrap(), wallet(2).receive_address().unwrap());
    }

    #[test]
    fn credit_only_own_outputs() {
        let w = wallet(1);
        let mut tx = deposit(&w.receive_address().unwrap(), &[100, 200], 1);
        tx.outputs.push(TxOutput {
            value: 999,
            script_pubkey: Script::p2pkh([0; 20]),
        });
        assert_eq!(w.credit(&tx, true).unwrap(), 2);
        assert_eq!(w.credit(&tx, true).unwrap(), 0);
        assert_eq!(w.balance(true).unwrap(), 300);
    }

    #[test]
    fn list_unspent_in_credit_order() {
        let w = wallet(1);
        let script = w.receive_address().unwrap();
        w.credit(&deposit(&script, &[5], 1), true).unwrap();
        w.credit(&deposit(&script, &[7], 2), true).unwrap();
        let amounts: Vec<u64> = w.list_unspent(true).unwrap().iter().map(|u| u.amount).collect();
        assert_eq!(amounts, vec![5, 7]);
    }

    #[test]
    fn unfinalized_hidden_until_finalized() {
        let w = wallet(1);
        w.credit(&deposit(&w.receive_address().unwrap(), &[50], 1), false).unwrap();
        assert_eq!(w.balance(true).unwrap(), 0);
        assert_eq!(w.balance(false).unwrap(), 50);
        w.finalize_all();
        assert_eq!(w.balance(true).unwrap(), 50);
    }

    #[test]
    fn colored_outputs_tracked_separately() {
        let w = wallet(1);
        let script = w.receive_address().unwrap();
        let color = ColorIdentifier::reissuable(&script);
        let tx = Transaction {
            outputs: vec![
                TxOutput { value: 10, script_pubkey: script.clone() },
                TxOutput { value: 300, script_pubkey: script.add_color(&color).unwrap() },
            ],
            ..deposit(&script, &[], 1)
        };
        w.credit(&tx, true).unwrap();
        assert_eq!(w.balance(true).unwrap(), 10);
        assert_eq!(w.token_balance(&color, true).unwrap(), 300);
    }

    #[test]
    fn apply_removes_spent() {
        let w = wallet(1);
        let script = w.receive_address().unwrap();
        let dep = deposit(&script, &[100], 1);
        w.credit(&dep, true).unwrap();

        let spend = Transaction {
            inputs: vec![TxInput::new(dep.outpoint(0).unwrap())],
            outputs: vec![TxOutput { value: 90, script_pubkey: w.change_address().unwrap() }],
            ..Transaction::new()
        };
        w.apply(&spend, false).unwrap();
        let utxos = w.list_unspent(false).unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].amount, 90);
        assert!(!utxos[0].finalized);
    }

    #[test]
    fn sign_tracked_inputs() {
        let w = wallet(1);
        let script = w.receive_address().unwrap();
        let dep = deposit(&script, &[100, 200], 1);
        w.credit(&dep, true).unwrap();

        let tx = Transaction {
            inputs: vec![
                TxInput::new(dep.outpoint(1).unwrap()),
                TxInput::new(dep.outpoint(0).unwrap()),
            ],
            outputs: vec![TxOutput { value: 250, script_pubkey: Script::p2pkh([9; 20]) }],
            ..Transaction::new()
        };
        let signed = w.sign_tx(tx, &[]).unwrap();
        verify_input(&signed, 0, &script, 200).unwrap();
        verify_input(&signed, 1, &script, 100).unwrap();
    }

    #[test]
    fn sign_with_explicit_prev_output() {
        let w = wallet(1);
        let script = w.receive_address().unwrap();
        let prev = PrevOutput {
            txid: Hash256([0xEE; 32]),
            index: 0,
            script_pubkey: script.clone(),
            amount: 5_000,
        };
        let tx = Transaction {
            inputs: vec![TxInput::new(prev.outpoint())],
            ..Transaction::new()
        };
        let signed = w.sign_tx(tx, std::slice::from_ref(&prev)).unwrap();
        verify_input(&signed, 0, &script, 5_000).unwrap();
    }

    #[test]
    fn sign_unknown_prev_output() {
        let w = wallet(1);
        let op = OutPoint::new(Hash256([0xEE; 32]), 3);
        let tx = Transaction {
            inputs: vec![TxInput::new(op)],
            ..Transaction::new()
        };
        assert_eq!(
            w.sign_tx(tx, &[]),
            Err(BackendError::MissingPrevOutput(op.to_string()))
        );
    }

    #[test]
    fn sign_foreign_key() {
        let w = wallet(1);
        let prev = PrevOutput {
            txid: Hash256([0xEE; 32]),
            index: 0,
            script_pubkey: Script::p2pkh([0x42; 20]),
            amount: 1,
        };
        let tx = Transaction {
            inputs: vec![TxInput::new(prev.outpoint())],
            ..Transaction::new()
        };
        assert!(matches!(w.sign_tx(tx, &[prev]), Err(BackendError::KeyNotFound(_))));
    }

    #[test]
    fn sign_p2sh_unsupported() {
        let w = wallet(1);
        let prev = PrevOutput {
            txid: Hash256([0xEE; 32]),
            index: 0,
            script_pubkey: Script::p2sh([0x42; 20]),
            amount: 1,
        };
        let tx = Transaction {
            inputs: vec![TxInput::new(prev.outpoint())],
            ..Transaction::new()
        };
        assert!(matches!(w.sign_tx(tx, &[prev]), Err(BackendError::UnsupportedScript(_))));
    }

    #[test]
    fn unloaded_wallet_refuses() {
        let w = wallet(1);
        w.unload();
        assert_eq!(
            w.list_unspent(true),
            Err(BackendError::WalletUnloaded("w1".into()))
        );
        assert!(w.receive_address().is_err());
        w.load();
        assert!(w.list_unspent(true).is_ok());
    }
}
