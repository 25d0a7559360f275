//! Collaborator interfaces for the transaction builder.
//!
//! - [`WalletBackend`]: UTXO listing, address issuance and signing
//! - [`FeeProvider`]: fee policy applied once per built transaction

use crate::error::BackendError;
use crate::script::Script;
use crate::types::{PrevOutput, Transaction, UnspentOutput};

/// A wallet that owns keys and tracks its unspent outputs.
///
/// The builder never inspects key material; it only asks for scripts and
/// hands back an assembled transaction for signing. Implementations that
/// hand out fresh addresses use interior mutability.
pub trait WalletBackend: Send + Sync {
    /// Unspent outputs owned by the wallet, plain and colored.
    ///
    /// The order must be stable for the duration of one selection pass; the
    /// selector consumes outputs in exactly this order.
    fn list_unspent(&self, only_finalized: bool) -> Result<Vec<UnspentOutput>, BackendError>;

    /// A plain locking script that receives payments and issued tokens.
    fn receive_address(&self) -> Result<Script, BackendError>;

    /// A plain locking script for change outputs.
    fn change_address(&self) -> Result<Script, BackendError>;

    /// Sign every input of `tx`.
    ///
    /// `prev_outputs` describes spent outputs the wallet does not track
    /// itself, such as the funding output of an issuance.
    fn sign_tx(
        &self,
        tx: Transaction,
        prev_outputs: &[PrevOutput],
    ) -> Result<Transaction, BackendError>;
}

/// Fee policy.
///
/// A size-independent policy is asked exactly once per builder operation,
/// on the empty transaction. A size-sensitive one is asked again on every
/// assembled draft until the fee stops rising.
pub trait FeeProvider: Send + Sync {
    /// Fee for the transaction in its current, possibly empty, state.
    fn fee(&self, tx: &Transaction) -> u64;

    /// Whether [`fee`](Self::fee) depends on the transaction's contents.
    fn is_size_sensitive(&self) -> bool {
        false
    }
}
