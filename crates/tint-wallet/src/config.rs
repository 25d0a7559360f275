//! Builder configuration.
//!
//! [`BuilderConfig`] carries the fee policy, the burn dust buffer and whether
//! only finalized outputs may be spent. It can be built programmatically,
//! parsed from JSON, or read from `TINT_*` environment variables.

use serde::{Deserialize, Serialize};
use tint_core::constants::{DEFAULT_DUST_BUFFER, DEFAULT_FIXED_FEE};
use tint_core::traits::FeeProvider;

use crate::error::WalletError;
use crate::fee::{FixedFeeProvider, SizeFeeProvider};

/// Fee policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeePolicyConfig {
    Fixed { fee: u64 },
    Size { per_byte: u64, minimum: u64 },
}

impl Default for FeePolicyConfig {
    fn default() -> Self {
        Self::Fixed {
            fee: DEFAULT_FIXED_FEE,
        }
    }
}

impl FeePolicyConfig {
    pub fn provider(&self) -> Box<dyn FeeProvider> {
        match *self {
            Self::Fixed { fee } => Box::new(FixedFeeProvider::new(fee)),
            Self::Size { per_byte, minimum } => Box::new(SizeFeeProvider::new(per_byte, minimum)),
        }
    }
}

/// Configuration for a [`TokenTxBuilder`](crate::builder::TokenTxBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub fee_policy: FeePolicyConfig,
    /// Plain value reserved above the fee when burning.
    pub dust_buffer: u64,
    /// Spend only outputs whose creating transaction is final.
    pub only_finalized: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            fee_policy: FeePolicyConfig::default(),
            dust_buffer: DEFAULT_DUST_BUFFER,
            only_finalized: true,
        }
    }
}

impl BuilderConfig {
    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Load from process environment variables.
    ///
    /// - `TINT_FEE_PER_BYTE` selects the size policy, with `TINT_MIN_FEE` as its floor
    /// - otherwise `TINT_FIXED_FEE` sets the fixed fee
    /// - `TINT_DUST_BUFFER`, `TINT_ONLY_FINALIZED`
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, using the same keys as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WalletError> {
        let defaults = Self::default();

        let fee_policy = match parse_var::<u64>(&lookup, "TINT_FEE_PER_BYTE")? {
            Some(per_byte) => FeePolicyConfig::Size {
                per_byte,
                minimum: parse_var(&lookup, "TINT_MIN_FEE")?.unwrap_or(0),
            },
            None => FeePolicyConfig::Fixed {
                fee: parse_var(&lookup, "TINT_FIXED_FEE")?.unwrap_or(DEFAULT_FIXED_FEE),
            },
        };

        Ok(Self {
            fee_policy,
            dust_buffer: parse_var(&lookup, "TINT_DUST_BUFFER")?.unwrap_or(defaults.dust_buffer),
            only_finalized: parse_var(&lookup, "TINT_ONLY_FINALIZED")?
                .unwrap_or(defaults.only_finalized),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, WalletError>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| WalletError::Config(format!("{key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tint_core::types::Transaction;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = BuilderConfig::default();
        assert_eq!(cfg.fee_policy, FeePolicyConfig::Fixed { fee: DEFAULT_FIXED_FEE });
        assert_eq!(cfg.dust_buffer, DEFAULT_DUST_BUFFER);
        assert!(cfg.only_finalized);
    }

    #[test]
    fn json_partial_uses_defaults() {
        let cfg = BuilderConfig::from_json(r#"{ "dust_buffer": 1000 }"#).unwrap();
        assert_eq!(cfg.dust_buffer, 1000);
        assert_eq!(cfg.fee_policy, FeePolicyConfig::default());
    }

    #[test]
    fn json_size_policy() {
        let cfg = BuilderConfig::from_json(
            r#"{ "fee_policy": { "kind": "size", "per_byte": 2, "minimum": 300 }, "only_finalized": false }"#,
        )
        .unwrap();
        assert_eq!(cfg.fee_policy, FeePolicyConfig::Size { per_byte: 2, minimum: 300 });
        assert!(!cfg.only_finalized);
    }

    #[test]
    fn json_invalid() {
        let err = BuilderConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn lookup_empty_is_default() {
        assert_eq!(BuilderConfig::from_lookup(lookup(&[])).unwrap(), BuilderConfig::default());
    }

    #[test]
    fn lookup_fixed_fee() {
        let cfg = BuilderConfig::from_lookup(lookup(&[
            ("TINT_FIXED_FEE", "250"),
            ("TINT_ONLY_FINALIZED", "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.fee_policy, FeePolicyConfig::Fixed { fee: 250 });
        assert!(!cfg.only_finalized);
    }

    #[test]
    fn lookup_size_policy_wins() {
        let cfg = BuilderConfig::from_lookup(lookup(&[
            ("TINT_FEE_PER_BYTE", "3"),
            ("TINT_MIN_FEE", "100"),
            ("TINT_FIXED_FEE", "999"),
        ]))
        .unwrap();
        assert_eq!(cfg.fee_policy, FeePolicyConfig::Size { per_byte: 3, minimum: 100 });
    }

    #[test]
    fn lookup_bad_number() {
        let err = BuilderConfig::from_lookup(lookup(&[("TINT_DUST_BUFFER", "lots")])).unwrap_err();
        match err {
            WalletError::Config(msg) => assert!(msg.starts_with("TINT_DUST_BUFFER")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn provider_from_policy() {
        let tx = Transaction::new();
        assert_eq!(FeePolicyConfig::Fixed { fee: 42 }.provider().fee(&tx), 42);
        assert_eq!(FeePolicyConfig::Size { per_byte: 0, minimum: 7 }.provider().fee(&tx), 7);
    }
}
