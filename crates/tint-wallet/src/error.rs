//! Wallet error types.

use thiserror::Error;
use tint_core::color::ColorIdentifier;
use tint_core::error::{BackendError, ColorError, ScriptError, TransactionError};

/// Errors that can occur while building token transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Plain value could not cover the requested amount plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Plain value found in the pool.
        have: u64,
        /// Required amount.
        need: u64,
    },

    /// Outputs of the requested color could not cover the requested amount.
    #[error("insufficient tokens of {color}: have {have}, need {need}")]
    InsufficientTokens {
        color: ColorIdentifier,
        have: u64,
        need: u64,
    },

    /// Invalid monetary or token amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The funding transaction has no usable output at index 0.
    #[error("invalid funding transaction: {0}")]
    InvalidFundingTransaction(String),

    /// Reissuance requested for a color that is not reissuable.
    #[error("color {0} is not reissuable")]
    NotReissuable(ColorIdentifier),

    /// Burn of all holdings requested, but none are held.
    #[error("no outputs of color {0} to burn")]
    NothingToBurn(ColorIdentifier),

    /// A size-sensitive fee kept rising as the transaction was rebuilt.
    #[error("fee did not settle, last estimate {fee}")]
    FeeUnsettled { fee: u64 },

    /// Configuration could not be loaded.
    #[error("config: {0}")]
    Config(String),

    /// Failure reported by the wallet backend.
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
