//! Integration test suite for Tint.
//!
//! Drives the token builder against the in-memory wallet the way an
//! application would: fund, issue, transfer, burn, and feed every signed
//! transaction back into the wallets involved.

pub mod helpers;
