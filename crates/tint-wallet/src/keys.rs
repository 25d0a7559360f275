//! Seed handling and deterministic key derivation.
//!
//! Child Ed25519 keys come from BLAKE3's key-derivation mode over
//! `seed || index`. Each key locks a plain P2PKH script; colored outputs to
//! the same key reuse its pubkey hash under a color prefix.

use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use tint_core::constants::HASH160_SIZE;
use tint_core::crypto::KeyPair;
use tint_core::script::Script;

/// BLAKE3 KDF context for child key derivation.
const KDF_CONTEXT: &str = "tint-wallet-key-derivation-v1";

/// A 32-byte master seed, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 32],
}

impl Seed {
    /// Generate a random seed from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Deterministic chain of child keys derived from one seed.
pub struct KeyChain {
    seed: Seed,
    next_index: u32,
    keypairs: HashMap<u32, KeyPair>,
    /// Reverse lookup: pubkey hash -> derivation index.
    index_by_hash: HashMap<[u8; HASH160_SIZE], u32>,
}

impl KeyChain {
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            next_index: 0,
            keypairs: HashMap::new(),
            index_by_hash: HashMap::new(),
        }
    }

    /// Derive (and cache) the keypair at `index`.
    pub fn derive_keypair(&mut self, index: u32) -> &KeyPair {
        if !self.keypairs.contains_key(&index) {
            let kp = derive_child_keypair(&self.seed, index);
            self.index_by_hash.insert(kp.public_key().pubkey_hash(), index);
            self.keypairs.insert(index, kp);
            if index >= self.next_index {
                self.next_index = index.saturating_add(1);
            }
        }
        &self.keypairs[&index]
    }

    /// P2PKH script for the key at `index`.
    pub fn script_at(&mut self, index: u32) -> Script {
        self.derive_keypair(index).public_key().p2pkh_script()
    }

    /// P2PKH script for a never-used key, advancing the index.
    pub fn next_script(&mut self) -> Script {
        let index = self.next_index;
        self.script_at(index)
    }

    pub fn keypair_for_pubkey_hash(&self, hash: &[u8; HASH160_SIZE]) -> Option<&KeyPair> {
        self.index_by_hash
            .get(hash)
            .and_then(|idx| self.keypairs.get(idx))
    }

    /// Whether `script` (plain or colored) pays to a key of this chain.
    pub fn owns(&self, script: &Script) -> bool {
        script
            .pubkey_hash()
            .is_some_and(|h| self.index_by_hash.contains_key(&h))
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("next_index", &self.next_index)
            .field("cached_keys", &self.keypairs.len())
            .finish()
    }
}

fn derive_child_keypair(seed: &Seed, index: u32) -> KeyPair {
    let mut ikm = Vec::with_capacity(36);
    ikm.extend_from_slice(seed.as_bytes());
    ikm.extend_from_slice(&index.to_le_bytes());
    KeyPair::from_secret_bytes(blake3::derive_key(KDF_CONTEXT, &ikm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_core::color::ColorIdentifier;

    #[test]
    fn seed_generate_unique() {
        assert_ne!(Seed::generate().as_bytes(), Seed::generate().as_bytes());
    }

    #[test]
    fn seed_debug_hides_bytes() {
        let debug = format!("{:?}", Seed::from_bytes([0xAB; 32]));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("ab"));
    }

    #[test]
    fn derive_deterministic_and_unique() {
        let seed = Seed::from_bytes([1u8; 32]);
        assert_eq!(
            derive_child_keypair(&seed, 0).public_key(),
            derive_child_keypair(&seed, 0).public_key()
        );
        assert_ne!(
            derive_child_keypair(&seed, 0).public_key(),
            derive_child_keypair(&seed, 1).public_key()
        );
        assert_ne!(
            derive_child_keypair(&seed, 0).public_key(),
            derive_child_keypair(&Seed::from_bytes([2u8; 32]), 0).public_key()
        );
    }

    #[test]
    fn next_script_advances() {
        let mut kc = KeyChain::new(Seed::from_bytes([3u8; 32]));
        let s0 = kc.next_script();
        let s1 = kc.next_script();
        assert_ne!(s0, s1);
        assert_eq!(kc.next_index(), 2);
    }

    #[test]
    fn script_at_is_stable_and_bumps_index() {
        let mut kc = KeyChain::new(Seed::from_bytes([4u8; 32]));
        assert_eq!(kc.script_at(5), kc.script_at(5));
        assert_eq!(kc.next_index(), 6);
    }

    #[test]
    fn lookup_by_pubkey_hash() {
        let mut kc = KeyChain::new(Seed::from_bytes([6u8; 32]));
        let script = kc.next_script();
        let hash = script.pubkey_hash().unwrap();
        let kp = kc.keypair_for_pubkey_hash(&hash).unwrap();
        assert_eq!(kp.public_key().p2pkh_script(), script);
        assert!(kc.keypair_for_pubkey_hash(&[0u8; 20]).is_none());
    }

    #[test]
    fn owns_plain_and_colored() {
        let mut kc = KeyChain::new(Seed::from_bytes([7u8; 32]));
        let script = kc.next_script();
        let colored = script.add_color(&ColorIdentifier::reissuable(&script)).unwrap();
        assert!(kc.owns(&script));
        assert!(kc.owns(&colored));
        assert!(!kc.owns(&Script::p2pkh([0; 20])));
        assert!(!kc.owns(&Script::p2sh([0; 20])));
    }

    #[test]
    fn keychain_debug_format() {
        let kc = KeyChain::new(Seed::from_bytes([10u8; 32]));
        assert!(format!("{kc:?}").contains("KeyChain"));
    }
}
