//! # tint-core
//! Foundation types and traits for colored-token transactions.

pub mod color;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod script;
pub mod traits;
pub mod types;
