//! Error types for Tint core types and collaborator boundaries.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("serialization: {0}")] Serialization(String),
    #[error("value overflow")] ValueOverflow,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("script is already colored")] AlreadyColored,
    #[error("unsupported script shape for coloring")] Uncolorable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color identifier length: {0}")] InvalidLength(usize),
    #[error("unknown color type: {0:#04x}")] UnknownType(u8),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("pubkey hash does not match locking script")] PubkeyHashMismatch,
    #[error("malformed script_sig")] MalformedScriptSig,
    #[error(transparent)] Transaction(#[from] TransactionError),
}

/// Failures reported by a wallet backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("wallet {0} is unloaded")] WalletUnloaded(String),
    #[error("no key for pubkey hash {0}")] KeyNotFound(String),
    #[error("previous output unknown: {0}")] MissingPrevOutput(String),
    #[error("unsupported locking script: {0}")] UnsupportedScript(String),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Script(#[from] ScriptError),
    #[error(transparent)] Transaction(#[from] TransactionError),
}
