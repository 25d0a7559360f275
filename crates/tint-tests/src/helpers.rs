//! Shared test helpers for integration tests.

use tint_core::crypto::verify_input;
use tint_core::error::CryptoError;
use tint_core::script::Script;
use tint_core::traits::WalletBackend;
use tint_core::types::{Hash256, OutPoint, Transaction, TxInput, TxOutput, UnspentOutput};
use tint_wallet::{MemoryWallet, Seed};

/// Wallet with a deterministic seed derived from one byte.
pub fn wallet(seed: u8) -> MemoryWallet {
    MemoryWallet::from_seed(format!("wallet-{seed}"), Seed::from_bytes([seed; 32]))
}

/// A transaction from outside any wallet paying each of `values` to `script`.
///
/// `nonce` fills the spent outpoint so repeated deposits get distinct txids.
pub fn make_deposit(script: &Script, values: &[u64], nonce: u8) -> Transaction {
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

/// Wallet holding one finalized plain output per entry of `values`, in order.
pub fn funded_wallet(seed: u8, values: &[u64]) -> MemoryWallet {
    let w = wallet(seed);
    let script = w.receive_address().unwrap();
    for (nonce, value) in values.iter().enumerate() {
        w.credit(&make_deposit(&script, &[*value], nonce as u8), true)
            .unwrap();
    }
    w
}

/// Feed `tx` to every wallet in `wallets` as a finalized transaction.
pub fn settle(tx: &Transaction, wallets: &[&MemoryWallet]) {
    for w in wallets {
        w.apply(tx, true).unwrap();
    }
}

/// Verify every input signature of `tx` against the outputs it spends.
///
/// Panics if an input spends an outpoint missing from `spent`.
pub fn verify_all_inputs(tx: &Transaction, spent: &[UnspentOutput]) -> Result<(), CryptoError> {
    for (i, input) in tx.inputs.iter().enumerate() {
        let prev = spent
            .iter()
            .find(|u| u.outpoint() == input.previous_output)
            .unwrap_or_else(|| panic!("input {i} spends an unknown outpoint"));
        verify_input(tx, i, &prev.script_pubkey, prev.amount)?;
    }
    Ok(())
}
