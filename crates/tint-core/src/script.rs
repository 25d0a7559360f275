//! Locking scripts and their shape inspection.
//!
//! Only four standard shapes are recognized:
//!
//! | kind     | layout                                              |
//! |----------|-----------------------------------------------------|
//! | `P2pkh`  | `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG` |
//! | `P2sh`   | `OP_HASH160 <20> OP_EQUAL`                          |
//! | `Cp2pkh` | `<33-byte color id> OP_COLOR` followed by P2PKH     |
//! | `Cp2sh`  | `<33-byte color id> OP_COLOR` followed by P2SH      |
//!
//! Colored scripts are recognized by layout alone. A colored layout whose
//! identifier has an unknown type byte is `ColoredUnknown`: still colored,
//! but carrying no usable color. Anything else is plain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::ColorIdentifier;
use crate::constants::opcodes::*;
use crate::constants::{COLOR_ID_SIZE, HASH160_SIZE};
use crate::error::ScriptError;

const P2PKH_LEN: usize = 25;
const P2SH_LEN: usize = 23;
/// Push opcode plus the color identifier plus `OP_COLOR`.
const COLOR_PREFIX_LEN: usize = 1 + COLOR_ID_SIZE + 1;

/// Shape of a locking script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    P2pkh,
    P2sh,
    Cp2pkh,
    Cp2sh,
    /// Colored layout with an unrecognized color type.
    ColoredUnknown,
    NonStandard,
}

impl ScriptKind {
    pub fn is_colored(self) -> bool {
        matches!(self, Self::Cp2pkh | Self::Cp2sh | Self::ColoredUnknown)
    }
}

/// Raw locking-script bytes.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Pay-to-pubkey-hash script.
    pub fn p2pkh(pubkey_hash: [u8; HASH160_SIZE]) -> Self {
        let mut bytes = Vec::with_capacity(P2PKH_LEN);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, HASH160_SIZE as u8]);
        bytes.extend_from_slice(&pubkey_hash);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    /// Pay-to-script-hash script.
    pub fn p2sh(script_hash: [u8; HASH160_SIZE]) -> Self {
        let mut bytes = Vec::with_capacity(P2SH_LEN);
        bytes.extend_from_slice(&[OP_HASH160, HASH160_SIZE as u8]);
        bytes.extend_from_slice(&script_hash);
        bytes.push(OP_EQUAL);
        Self(bytes)
    }

    /// Classify the script by its byte layout.
    pub fn kind(&self) -> ScriptKind {
        if is_p2pkh(&self.0) {
            return ScriptKind::P2pkh;
        }
        if is_p2sh(&self.0) {
            return ScriptKind::P2sh;
        }
        if !has_color_prefix(&self.0) {
            return ScriptKind::NonStandard;
        }
        let body = &self.0[COLOR_PREFIX_LEN..];
        let shaped = if is_p2pkh(body) {
            ScriptKind::Cp2pkh
        } else if is_p2sh(body) {
            ScriptKind::Cp2sh
        } else {
            return ScriptKind::NonStandard;
        };
        if self.color_id().is_some() {
            shaped
        } else {
            ScriptKind::ColoredUnknown
        }
    }

    pub fn is_colored(&self) -> bool {
        self.kind().is_colored()
    }

    /// The color identifier embedded in the prefix, if the prefix is well
    /// formed and its type is known.
    ///
    /// Does not check the body; use [`kind`](Self::kind) for a full shape test.
    pub fn color_id(&self) -> Option<ColorIdentifier> {
        if !has_color_prefix(&self.0) {
            return None;
        }
        ColorIdentifier::from_bytes(&self.0[1..=COLOR_ID_SIZE]).ok()
    }

    /// Colored copy of a plain P2PKH or P2SH script.
    pub fn add_color(&self, color_id: &ColorIdentifier) -> Result<Self, ScriptError> {
        match self.kind() {
            ScriptKind::P2pkh | ScriptKind::P2sh => {}
            ScriptKind::Cp2pkh | ScriptKind::Cp2sh | ScriptKind::ColoredUnknown => {
                return Err(ScriptError::AlreadyColored);
            }
            ScriptKind::NonStandard => return Err(ScriptError::Uncolorable),
        }
        let mut bytes = Vec::with_capacity(COLOR_PREFIX_LEN + self.0.len());
        bytes.push(COLOR_ID_SIZE as u8);
        bytes.extend_from_slice(&color_id.to_bytes());
        bytes.push(OP_COLOR);
        bytes.extend_from_slice(&self.0);
        Ok(Self(bytes))
    }

    /// The plain script underneath a colored one; plain scripts are returned as is.
    pub fn remove_color(&self) -> Self {
        if self.is_colored() {
            Self(self.0[COLOR_PREFIX_LEN..].to_vec())
        } else {
            self.clone()
        }
    }

    /// The 20-byte pubkey hash of a P2PKH or CP2PKH script.
    pub fn pubkey_hash(&self) -> Option<[u8; HASH160_SIZE]> {
        let body = match self.kind() {
            ScriptKind::P2pkh => &self.0[..],
            ScriptKind::Cp2pkh => &self.0[COLOR_PREFIX_LEN..],
            _ => return None,
        };
        let mut out = [0u8; HASH160_SIZE];
        out.copy_from_slice(&body[3..3 + HASH160_SIZE]);
        Some(out)
    }
}

/// `<33-byte push> OP_COLOR` followed by at least one byte.
fn has_color_prefix(b: &[u8]) -> bool {
    b.len() > COLOR_PREFIX_LEN && b[0] == COLOR_ID_SIZE as u8 && b[COLOR_PREFIX_LEN - 1] == OP_COLOR
}

fn is_p2pkh(b: &[u8]) -> bool {
    b.len() == P2PKH_LEN
        && b[0] == OP_DUP
        && b[1] == OP_HASH160
        && b[2] == HASH160_SIZE as u8
        && b[23] == OP_EQUALVERIFY
        && b[24] == OP_CHECKSIG
}

fn is_p2sh(b: &[u8]) -> bool {
    b.len() == P2SH_LEN && b[0] == OP_HASH160 && b[1] == HASH160_SIZE as u8 && b[22] == OP_EQUAL
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| ScriptError::InvalidHex(e.to_string()))
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
