//! Ed25519 signing of transaction inputs.
//!
//! # Signing scheme
//!
//! Each input is signed over a **sighash** that commits to:
//! - transaction version and lock_time
//! - all input outpoints (txid + index)
//! - all outputs (value + locking script)
//! - the index of the input being signed
//! - the locking script and amount of the output that input spends
//!
//! Unlocking data is excluded, so inputs can be signed in any order. The
//! resulting `script_sig` is two pushes: `<64-byte signature> <32-byte pubkey>`.

use ed25519_dalek::{Signer, Verifier};
use std::fmt;

use crate::constants::HASH160_SIZE;
use crate::error::{CryptoError, TransactionError};
use crate::script::Script;
use crate::types::{Hash256, Transaction};

const SIG_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;

/// Length of a signed input's `script_sig`: two push bytes, signature, pubkey.
pub const SCRIPT_SIG_SIZE: usize = 2 + SIG_LEN + PUBKEY_LEN;

/// Ed25519 keypair for signing inputs.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Get the raw secret key bytes (32 bytes). Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(self.secret_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key.
#[derive(Clone)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The 20-byte hash embedded in P2PKH scripts.
    pub fn pubkey_hash(&self) -> [u8; HASH160_SIZE] {
        pubkey_hash(&self.to_bytes())
    }

    /// Plain P2PKH locking script paying to this key.
    pub fn p2pkh_script(&self) -> Script {
        Script::p2pkh(self.pubkey_hash())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

/// First 20 bytes of BLAKE3 over the raw public key.
pub fn pubkey_hash(pubkey_bytes: &[u8; 32]) -> [u8; HASH160_SIZE] {
    let digest = blake3::hash(pubkey_bytes);
    let mut out = [0u8; HASH160_SIZE];
    out.copy_from_slice(&digest.as_bytes()[..HASH160_SIZE]);
    out
}

/// Compute the signing hash for input `input_index`, which spends an output
/// locked by `prev_script` holding `prev_amount`.
pub fn sighash(
    tx: &Transaction,
    input_index: usize,
    prev_script: &Script,
    prev_amount: u64,
) -> Result<Hash256, CryptoError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        }
        .into());
    }

    let mut data = Vec::new();
    data.extend_from_slice(&tx.version.to_le_bytes());

    data.extend_from_slice(&(tx.inputs.len() as u64).to_le_bytes());
    for input in &tx.inputs {
        data.extend_from_slice(&input.previous_output.to_bytes());
    }

    data.extend_from_slice(&(tx.outputs.len() as u64).to_le_bytes());
    for output in &tx.outputs {
        data.extend_from_slice(&output.value.to_le_bytes());
        push_bytes(&mut data, output.script_pubkey.as_bytes());
    }

    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data.extend_from_slice(&(input_index as u64).to_le_bytes());
    push_bytes(&mut data, prev_script.as_bytes());
    data.extend_from_slice(&prev_amount.to_le_bytes());

    Ok(Hash256(blake3::hash(&data).into()))
}

fn push_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    data.extend_from_slice(bytes);
}

/// Sign an input in place, writing `<sig> <pubkey>` into its `script_sig`.
pub fn sign_input(
    tx: &mut Transaction,
    input_index: usize,
    prev_script: &Script,
    prev_amount: u64,
    keypair: &KeyPair,
) -> Result<(), CryptoError> {
    let hash = sighash(tx, input_index, prev_script, prev_amount)?;
    let signature = keypair.sign(hash.as_bytes());
    let pubkey = keypair.public_key().to_bytes();

    let mut script_sig = Vec::with_capacity(SCRIPT_SIG_SIZE);
    script_sig.push(SIG_LEN as u8);
    script_sig.extend_from_slice(&signature);
    script_sig.push(PUBKEY_LEN as u8);
    script_sig.extend_from_slice(&pubkey);
    tx.inputs[input_index].script_sig = script_sig;
    Ok(())
}

/// Verify an input's `script_sig` against the P2PKH or CP2PKH script it spends.
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    prev_script: &Script,
    prev_amount: u64,
) -> Result<(), CryptoError> {
    let input = tx.inputs.get(input_index).ok_or(TransactionError::InputIndexOutOfBounds {
        index: input_index,
        len: tx.inputs.len(),
    })?;

    let ss = &input.script_sig;
    if ss.len() != SCRIPT_SIG_SIZE
        || ss[0] != SIG_LEN as u8
        || ss[1 + SIG_LEN] != PUBKEY_LEN as u8
    {
        return Err(CryptoError::MalformedScriptSig);
    }
    let sig: [u8; SIG_LEN] = ss[1..1 + SIG_LEN]
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let pk_bytes: [u8; PUBKEY_LEN] = ss[2 + SIG_LEN..]
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let pk = PublicKey::from_bytes(&pk_bytes)?;

    if prev_script.pubkey_hash() != Some(pk.pubkey_hash()) {
        return Err(CryptoError::PubkeyHashMismatch);
    }

    let hash = sighash(tx, input_index, prev_script, prev_amount)?;
    pk.verify(hash.as_bytes(), &sig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorIdentifier;
    use crate::types::{OutPoint, TxInput, TxOutput};

    fn sample_tx(n_inputs: usize) -> Transaction {
        Transaction {
            version: 1,
            inputs: (0..n_inputs)
                .map(|i| TxInput::new(OutPoint::new(Hash256([i as u8 + 1; 32]), 0)))
                .collect(),
            outputs: vec![TxOutput {
                value: 500,
                script_pubkey: Script::p2pkh([0xAA; 20]),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn keypair_from_secret_deterministic() {
        let kp1 = KeyPair::from_secret_bytes([42u8; 32]);
        let kp2 = KeyPair::from_secret_bytes([42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_ne!(kp1.public_key(), KeyPair::from_secret_bytes([1u8; 32]).public_key());
    }

    #[test]
    fn keypair_debug_hides_secret() {
        let kp = KeyPair::generate();
        let debug = format!("{kp:?}");
        assert!(debug.contains("public_key"));
        assert!(!debug.contains(&hex::encode(kp.secret_bytes())));
    }

    #[test]
    fn p2pkh_script_embeds_hash() {
        let pk = KeyPair::from_secret_bytes([3u8; 32]).public_key();
        assert_eq!(pk.p2pkh_script().pubkey_hash(), Some(pk.pubkey_hash()));
    }

    #[test]
    fn sign_and_verify() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]);
        let prev = kp.public_key().p2pkh_script();
        let mut tx = sample_tx(2);
        sign_input(&mut tx, 0, &prev, 1_000, &kp).unwrap();
        sign_input(&mut tx, 1, &prev, 2_000, &kp).unwrap();
        assert_eq!(tx.inputs[0].script_sig.len(), SCRIPT_SIG_SIZE);
        verify_input(&tx, 0, &prev, 1_000).unwrap();
        verify_input(&tx, 1, &prev, 2_000).unwrap();
    }

    #[test]
    fn verify_colored_prev_script() {
        let kp = KeyPair::from_secret_bytes([8u8; 32]);
        let color = ColorIdentifier::reissuable(&kp.public_key().p2pkh_script());
        let prev = kp.public_key().p2pkh_script().add_color(&color).unwrap();
        let mut tx = sample_tx(1);
        sign_input(&mut tx, 0, &prev, 10, &kp).unwrap();
        verify_input(&tx, 0, &prev, 10).unwrap();
    }

    #[test]
    fn verify_fails_on_wrong_amount() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]);
        let prev = kp.public_key().p2pkh_script();
        let mut tx = sample_tx(1);
        sign_input(&mut tx, 0, &prev, 1_000, &kp).unwrap();
        assert_eq!(
            verify_input(&tx, 0, &prev, 999),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn verify_fails_on_foreign_script() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]);
        let mut tx = sample_tx(1);
        sign_input(&mut tx, 0, &kp.public_key().p2pkh_script(), 1, &kp).unwrap();
        assert_eq!(
            verify_input(&tx, 0, &Script::p2pkh([0; 20]), 1),
            Err(CryptoError::PubkeyHashMismatch)
        );
    }

    #[test]
    fn verify_fails_after_output_tamper() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]);
        let prev = kp.public_key().p2pkh_script();
        let mut tx = sample_tx(1);
        sign_input(&mut tx, 0, &prev, 1, &kp).unwrap();
        tx.outputs[0].value += 1;
        assert_eq!(
            verify_input(&tx, 0, &prev, 1),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn unsigned_input_is_malformed() {
        let tx = sample_tx(1);
        assert_eq!(
            verify_input(&tx, 0, &Script::p2pkh([0; 20]), 1),
            Err(CryptoError::MalformedScriptSig)
        );
    }

    #[test]
    fn sighash_index_out_of_bounds() {
        let tx = sample_tx(1);
        let err = sighash(&tx, 5, &Script::default(), 0).unwrap_err();
        assert_eq!(
            err,
            CryptoError::Transaction(TransactionError::InputIndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn sighash_differs_per_input() {
        let tx = sample_tx(2);
        let s = Script::p2pkh([1; 20]);
        assert_ne!(sighash(&tx, 0, &s, 1).unwrap(), sighash(&tx, 1, &s, 1).unwrap());
    }
}
