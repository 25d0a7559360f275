//! Color identifiers: fingerprints naming a token class.
//!
//! A color identifier is one type byte followed by a SHA-256 digest. The
//! digest input depends on the type:
//!
//! - reissuable: the issuer's locking script, so the holder of that script
//!   can mint the same color again;
//! - non-reissuable and NFT: an outpoint consumed by the issuing
//!   transaction, which can never be spent twice.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::constants::COLOR_ID_SIZE;
use crate::error::ColorError;
use crate::script::Script;
use crate::types::OutPoint;

/// Token class type, encoded as the first byte of a [`ColorIdentifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorType {
    Reissuable,
    NonReissuable,
    Nft,
}

impl ColorType {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Reissuable => 0xc1,
            Self::NonReissuable => 0xc2,
            Self::Nft => 0xc3,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, ColorError> {
        match b {
            0xc1 => Ok(Self::Reissuable),
            0xc2 => Ok(Self::NonReissuable),
            0xc3 => Ok(Self::Nft),
            other => Err(ColorError::UnknownType(other)),
        }
    }
}

impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reissuable => write!(f, "reissuable"),
            Self::NonReissuable => write!(f, "non-reissuable"),
            Self::Nft => write!(f, "nft"),
        }
    }
}

/// Fingerprint of a token class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorIdentifier {
    color_type: ColorType,
    payload: [u8; 32],
}

impl ColorIdentifier {
    /// Color bound to an issuer script.
    pub fn reissuable(script: &Script) -> Self {
        Self {
            color_type: ColorType::Reissuable,
            payload: Sha256::digest(script.as_bytes()).into(),
        }
    }

    /// Color bound to a consumed outpoint.
    pub fn non_reissuable(outpoint: &OutPoint) -> Self {
        Self {
            color_type: ColorType::NonReissuable,
            payload: Sha256::digest(outpoint.to_bytes()).into(),
        }
    }

    /// Single-unit color bound to a consumed outpoint.
    pub fn nft(outpoint: &OutPoint) -> Self {
        Self {
            color_type: ColorType::Nft,
            payload: Sha256::digest(outpoint.to_bytes()).into(),
        }
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub fn payload(&self) -> &[u8; 32] {
        &self.payload
    }

    pub fn is_reissuable(&self) -> bool {
        self.color_type == ColorType::Reissuable
    }

    pub fn to_bytes(&self) -> [u8; COLOR_ID_SIZE] {
        let mut out = [0u8; COLOR_ID_SIZE];
        out[0] = self.color_type.to_byte();
        out[1..].copy_from_slice(&self.payload);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ColorError> {
        if bytes.len() != COLOR_ID_SIZE {
            return Err(ColorError::InvalidLength(bytes.len()));
        }
        let color_type = ColorType::from_byte(bytes[0])?;
        let mut payload = [0u8; 32];
        payload.copy_from_slice(&bytes[1..]);
        Ok(Self { color_type, payload })
    }
}

impl fmt::Display for ColorIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for ColorIdentifier {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ColorError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for ColorIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ColorIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
