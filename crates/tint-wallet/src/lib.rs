//! # tint-wallet: colored-token transaction construction.
//!
//! Builds funding, issuance, reissuance, transfer and burn transactions on
//! top of a [`WalletBackend`](tint_core::traits::WalletBackend), using
//! first-fit greedy UTXO selection split into plain and colored pools.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`coin_selection`]: Greedy selection filtered by color
//! - [`fee`]: Fixed and size-based fee policies
//! - [`builder`]: Token transaction builder
//! - [`config`]: Builder configuration from JSON or environment
//! - [`keys`]: Seed and BLAKE3-derived keychain
//! - [`wallet`]: In-memory reference wallet backend

pub mod builder;
pub mod coin_selection;
pub mod config;
pub mod error;
pub mod fee;
pub mod keys;
pub mod wallet;

// Re-exports for convenient access
pub use builder::{Issuance, TokenTxBuilder};
pub use coin_selection::{CoinSelection, CoinSelector, ColorFilter};
pub use config::{BuilderConfig, FeePolicyConfig};
pub use error::WalletError;
pub use fee::{FixedFeeProvider, SizeFeeProvider};
pub use keys::{KeyChain, Seed};
pub use wallet::MemoryWallet;
