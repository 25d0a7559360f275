//! First-fit greedy UTXO selection, filtered by color.
//!
//! Walks the pool in the order given, skips outputs that fail the color
//! filter, and stops at the first prefix whose sum reaches the target. There
//! is no sorting, no randomization and no attempt to minimize change: the
//! caller's ordering fully determines the result.
//!
//! Two filters exist. The plain pool always yields at least one output and
//! fails with [`WalletError::InsufficientFunds`] when exhausted. The colored
//! pool treats a zero target as "take every output of this color" and only
//! fails with [`WalletError::InsufficientTokens`] for a positive target.

use tint_core::color::ColorIdentifier;
use tint_core::script::Script;
use tint_core::error::TransactionError;
use tint_core::types::UnspentOutput;
use tracing::debug;

use crate::error::WalletError;

/// Which outputs a selection pass may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFilter {
    /// Plain value only.
    Uncolored,
    /// Outputs tagged with exactly this color.
    Colored(ColorIdentifier),
}

impl ColorFilter {
    pub fn matches(&self, script: &Script) -> bool {
        match self {
            Self::Uncolored => !script.is_colored(),
            Self::Colored(color) => script.is_colored() && script.color_id().as_ref() == Some(color),
        }
    }

    fn is_satisfied(&self, total: u64, target: u64) -> bool {
        match self {
            Self::Uncolored => total >= target,
            Self::Colored(_) => target > 0 && total >= target,
        }
    }
}

/// Result of coin selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinSelection {
    /// Selected outputs, in pool order.
    pub selected: Vec<UnspentOutput>,
    /// Sum of the selected amounts.
    pub total: u64,
}

impl CoinSelection {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Greedy coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select outputs from `pool` matching `filter` until `target` is reached.
    pub fn select(
        pool: &[UnspentOutput],
        filter: &ColorFilter,
        target: u64,
    ) -> Result<CoinSelection, WalletError> {
        let mut selected = Vec::new();
        let mut total: u64 = 0;

        for utxo in pool {
            if !filter.matches(&utxo.script_pubkey) {
                continue;
            }
            total = total
                .checked_add(utxo.amount)
                .ok_or(TransactionError::ValueOverflow)?;
            selected.push(utxo.clone());

            if filter.is_satisfied(total, target) {
                debug!(?filter, target, total, inputs = selected.len(), "selection complete");
                return Ok(CoinSelection { selected, total });
            }
        }

        match filter {
            ColorFilter::Uncolored => Err(WalletError::InsufficientFunds {
                have: total,
                need: target,
            }),
            ColorFilter::Colored(color) if target > 0 => Err(WalletError::InsufficientTokens {
                color: *color,
                have: total,
                need: target,
            }),
            ColorFilter::Colored(_) => {
                debug!(?filter, total, inputs = selected.len(), "swept colored pool");
                Ok(CoinSelection { selected, total })
            }
        }
    }

    /// Select plain value for `target`.
    pub fn select_uncolored(
        pool: &[UnspentOutput],
        target: u64,
    ) -> Result<CoinSelection, WalletError> {
        Self::select(pool, &ColorFilter::Uncolored, target)
    }

    /// Select outputs of `color` for `target`; a zero target takes them all.
    pub fn select_colored(
        pool: &[UnspentOutput],
        color: &ColorIdentifier,
        target: u64,
    ) -> Result<CoinSelection, WalletError> {
        Self::select(pool, &ColorFilter::Colored(*color), target)
    }

    /// Sum of every output in `pool` matching `filter`.
    pub fn balance(pool: &[UnspentOutput], filter: &ColorFilter) -> Result<u64, WalletError> {
        pool.iter()
            .filter(|u| filter.matches(&u.script_pubkey))
            .try_fold(0u64, |acc, u| acc.checked_add(u.amount))
            .ok_or_else(|| TransactionError::ValueOverflow.into())
    }
}
