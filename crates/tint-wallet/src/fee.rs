//! Fee policies.

use tint_core::constants::DEFAULT_FIXED_FEE;
use tint_core::traits::FeeProvider;
use tint_core::types::Transaction;
use tracing::warn;

/// Charges the same fee for every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFeeProvider {
    fee: u64,
}

impl FixedFeeProvider {
    pub fn new(fee: u64) -> Self {
        Self { fee }
    }
}

impl Default for FixedFeeProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_FEE)
    }
}

impl FeeProvider for FixedFeeProvider {
    fn fee(&self, _tx: &Transaction) -> u64 {
        self.fee
    }
}

/// Charges `per_byte` for each byte of the encoded transaction, never less
/// than `minimum`.
///
/// The builder prices the assembled transaction with signature-sized
/// unlocking data, so the charge covers the signed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFeeProvider {
    per_byte: u64,
    minimum: u64,
}

impl SizeFeeProvider {
    pub fn new(per_byte: u64, minimum: u64) -> Self {
        Self { per_byte, minimum }
    }
}

impl FeeProvider for SizeFeeProvider {
    fn fee(&self, tx: &Transaction) -> u64 {
        match tx.encoded_size() {
            Ok(size) => (size as u64).saturating_mul(self.per_byte).max(self.minimum),
            Err(e) => {
                warn!("cannot size transaction for fee: {e}; charging minimum");
                self.minimum
            }
        }
    }

    fn is_size_sensitive(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_core::script::Script;
    use tint_core::types::{Hash256, OutPoint, TxInput, TxOutput};

    #[test]
    fn fixed_default() {
        assert_eq!(FixedFeeProvider::default().fee(&Transaction::new()), DEFAULT_FIXED_FEE);
    }

    #[test]
    fn fixed_ignores_size() {
        let fp = FixedFeeProvider::new(100);
        let mut tx = Transaction::new();
        assert_eq!(fp.fee(&tx), 100);
        tx.inputs.push(TxInput::new(OutPoint::new(Hash256::ZERO, 0)));
        assert_eq!(fp.fee(&tx), 100);
        assert!(!fp.is_size_sensitive());
    }

    #[test]
    fn size_fee_applies_minimum() {
        let fp = SizeFeeProvider::new(1, 1_000);
        assert_eq!(fp.fee(&Transaction::new()), 1_000);
    }

    #[test]
    fn size_fee_grows_with_transaction() {
        let fp = SizeFeeProvider::new(10, 0);
        let empty = fp.fee(&Transaction::new());
        let mut tx = Transaction::new();
        for i in 0..3 {
            tx.inputs.push(TxInput::new(OutPoint::new(Hash256([i; 32]), 0)));
            tx.outputs.push(TxOutput {
                value: 1,
                script_pubkey: Script::p2pkh([i; 20]),
            });
        }
        let full = fp.fee(&tx);
        assert!(full > empty);
        assert_eq!(full, tx.encoded_size().unwrap() as u64 * 10);
        assert!(fp.is_size_sensitive());
    }
}
