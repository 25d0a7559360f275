//! Token transaction builder.
//!
//! Each operation follows the same sequence:
//! 1. Ask the fee policy for the fee (on the still-empty transaction)
//! 2. Fetch the wallet's unspent outputs and run the selector against the
//!    plain pool, the color pool, or both
//! 3. Append inputs, then the receiver output, then change outputs
//! 4. For a size-sensitive fee policy, re-price the assembled transaction
//!    and rebuild from step 3 while the fee rises
//! 5. Hand the assembled transaction to the wallet for signing
//!
//! The in-progress [`Transaction`] is owned by the operation and threaded
//! through the helpers by `&mut`; nothing is shared between calls.

use tint_core::color::ColorIdentifier;
use tint_core::constants::{DEFAULT_DUST_BUFFER, NFT_SUPPLY};
use tint_core::crypto::SCRIPT_SIG_SIZE;
use tint_core::error::ScriptError;
use tint_core::script::Script;
use tint_core::traits::{FeeProvider, WalletBackend};
use tint_core::types::{OutPoint, PrevOutput, Transaction, TxInput, TxOutput, UnspentOutput};
use tracing::{debug, info};

use crate::coin_selection::{CoinSelector, ColorFilter};
use crate::config::BuilderConfig;
use crate::error::WalletError;
use crate::fee::FixedFeeProvider;

/// Re-pricing passes before a size-sensitive fee is declared unsettled.
const MAX_FEE_ROUNDS: usize = 8;

/// A signed issuance and the color it created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub tx: Transaction,
    pub color_id: ColorIdentifier,
}

/// Builder for funding, issuance, reissuance, transfer and burn transactions.
///
/// # Example
/// ```ignore
/// let builder = TokenTxBuilder::new();
/// let funding = builder.create_funding_tx(&issuer, 20_000, None)?;
/// let issued = builder.create_issue_tx_for_reissuable_token(&funding, &issuer, 1_000)?;
/// let tx = builder.create_transfer_tx(&issued.color_id, &issuer, &receiver_script, 250)?;
/// ```
pub struct TokenTxBuilder {
    fee_provider: Box<dyn FeeProvider>,
    dust_buffer: u64,
    only_finalized: bool,
}

impl TokenTxBuilder {
    /// Builder with the default fixed fee and dust buffer, spending only
    /// finalized outputs.
    pub fn new() -> Self {
        Self {
            fee_provider: Box::new(FixedFeeProvider::default()),
            dust_buffer: DEFAULT_DUST_BUFFER,
            only_finalized: true,
        }
    }

    pub fn from_config(config: &BuilderConfig) -> Self {
        Self {
            fee_provider: config.fee_policy.provider(),
            dust_buffer: config.dust_buffer,
            only_finalized: config.only_finalized,
        }
    }

    pub fn set_fee_provider(&mut self, fee_provider: Box<dyn FeeProvider>) -> &mut Self {
        self.fee_provider = fee_provider;
        self
    }

    /// Override the burn dust buffer (default: [`DEFAULT_DUST_BUFFER`]).
    pub fn set_dust_buffer(&mut self, dust_buffer: u64) -> &mut Self {
        self.dust_buffer = dust_buffer;
        self
    }

    pub fn set_only_finalized(&mut self, only_finalized: bool) -> &mut Self {
        self.only_finalized = only_finalized;
        self
    }

    /// Pay `amount` of plain value to `script`, or to the wallet's own
    /// receive address when `script` is `None`.
    pub fn create_funding_tx(
        &self,
        wallet: &dyn WalletBackend,
        amount: u64,
        script: Option<Script>,
    ) -> Result<Transaction, WalletError> {
        require_positive(amount)?;
        let receiver_script = match script {
            Some(s) if s.is_colored() => return Err(ScriptError::AlreadyColored.into()),
            Some(s) => s,
            None => wallet.receive_address()?,
        };
        let utxos = wallet.list_unspent(self.only_finalized)?;

        let (tx, fee, ()) = self.priced(|fee| {
            let need = checked_total(amount, fee)?;
            let funds = CoinSelector::select_uncolored(&utxos, need)?;
            let mut tx = Transaction::new();
            append_inputs(&mut tx, &funds.selected);
            tx.outputs.push(TxOutput {
                value: amount,
                script_pubkey: receiver_script.clone(),
            });
            append_change(&mut tx, wallet, funds.total - need, None)?;
            Ok((tx, ()))
        })?;
        self.finish("funding", wallet, tx, fee, &[])
    }

    /// Issue `amount` of a reissuable color bound to the issuer's receive
    /// script, spending output 0 of `funding_tx`.
    pub fn create_issue_tx_for_reissuable_token(
        &self,
        funding_tx: &Transaction,
        issuer: &dyn WalletBackend,
        amount: u64,
    ) -> Result<Issuance, WalletError> {
        self.issue_from_funding("reissuable issue", funding_tx, issuer, amount, None)
    }

    /// Issue `amount` of a color bound to the first outpoint this
    /// transaction consumes.
    pub fn create_issue_tx_for_non_reissuable_token(
        &self,
        issuer: &dyn WalletBackend,
        amount: u64,
    ) -> Result<Issuance, WalletError> {
        self.issue_from_outpoint("non-reissuable issue", issuer, amount, ColorIdentifier::non_reissuable)
    }

    /// Issue a single-unit NFT color.
    pub fn create_issue_tx_for_nft_token(
        &self,
        issuer: &dyn WalletBackend,
    ) -> Result<Issuance, WalletError> {
        self.issue_from_outpoint("nft issue", issuer, NFT_SUPPLY, ColorIdentifier::nft)
    }

    /// Mint `amount` more of an existing reissuable color, spending output 0
    /// of `funding_tx`.
    pub fn create_reissue_tx(
        &self,
        funding_tx: &Transaction,
        issuer: &dyn WalletBackend,
        amount: u64,
        color_id: &ColorIdentifier,
    ) -> Result<Transaction, WalletError> {
        if !color_id.is_reissuable() {
            return Err(WalletError::NotReissuable(*color_id));
        }
        self.issue_from_funding("reissue", funding_tx, issuer, amount, Some(*color_id))
            .map(|issuance| issuance.tx)
    }

    /// Move `amount` of `color_id` from `sender` to `receiver` (a plain
    /// script; the builder tags it with the color).
    pub fn create_transfer_tx(
        &self,
        color_id: &ColorIdentifier,
        sender: &dyn WalletBackend,
        receiver: &Script,
        amount: u64,
    ) -> Result<Transaction, WalletError> {
        require_positive(amount)?;
        let receiver_script = receiver.add_color(color_id)?;
        let utxos = sender.list_unspent(self.only_finalized)?;
        let tokens = CoinSelector::select_colored(&utxos, color_id, amount)?;

        let (tx, fee, ()) = self.priced(|fee| {
            let funds = CoinSelector::select_uncolored(&utxos, fee)?;
            let mut tx = Transaction::new();
            append_inputs(&mut tx, &funds.selected);
            append_inputs(&mut tx, &tokens.selected);
            tx.outputs.push(TxOutput {
                value: amount,
                script_pubkey: receiver_script.clone(),
            });
            append_change(&mut tx, sender, tokens.total - amount, Some(color_id))?;
            append_change(&mut tx, sender, funds.total - fee, None)?;
            Ok((tx, ()))
        })?;
        self.finish("transfer", sender, tx, fee, &[])
    }

    /// Destroy `amount` of `color_id`; zero burns every output of that color
    /// the sender holds.
    pub fn create_burn_tx(
        &self,
        color_id: &ColorIdentifier,
        sender: &dyn WalletBackend,
        amount: u64,
    ) -> Result<Transaction, WalletError> {
        let utxos = sender.list_unspent(self.only_finalized)?;

        let (tx, fee, burned) = self.priced(|fee| {
            let need = checked_total(fee, self.dust_buffer)?;
            let funds = CoinSelector::select_uncolored(&utxos, need)?;
            let tokens = CoinSelector::select_colored(&utxos, color_id, amount)?;
            if tokens.is_empty() {
                return Err(WalletError::NothingToBurn(*color_id));
            }
            let mut tx = Transaction::new();
            append_inputs(&mut tx, &funds.selected);
            append_inputs(&mut tx, &tokens.selected);
            if amount > 0 {
                append_change(&mut tx, sender, tokens.total - amount, Some(color_id))?;
            }
            append_change(&mut tx, sender, funds.total - fee, None)?;
            let burned = if amount > 0 { amount } else { tokens.total };
            Ok((tx, burned))
        })?;
        debug!(%color_id, burned, "burning tokens");
        self.finish("burn", sender, tx, fee, &[])
    }

    /// Total held of `color_id`, from a zero-target scan of the color pool.
    pub fn token_balance(
        &self,
        wallet: &dyn WalletBackend,
        color_id: &ColorIdentifier,
    ) -> Result<u64, WalletError> {
        let utxos = wallet.list_unspent(self.only_finalized)?;
        Ok(CoinSelector::select_colored(&utxos, color_id, 0)?.total)
    }

    /// Plain value held by `wallet`.
    pub fn balance(&self, wallet: &dyn WalletBackend) -> Result<u64, WalletError> {
        let utxos = wallet.list_unspent(self.only_finalized)?;
        CoinSelector::balance(&utxos, &ColorFilter::Uncolored)
    }

    fn issue_from_funding(
        &self,
        label: &'static str,
        funding_tx: &Transaction,
        issuer: &dyn WalletBackend,
        amount: u64,
        color_id: Option<ColorIdentifier>,
    ) -> Result<Issuance, WalletError> {
        require_positive(amount)?;
        let funding = funding_output(funding_tx)?;
        let receiver_script = issuer.receive_address()?;
        let color_id = color_id.unwrap_or_else(|| ColorIdentifier::reissuable(&receiver_script));
        let colored_receiver = receiver_script.add_color(&color_id)?;

        let (tx, fee, ()) = self.priced(|fee| {
            if funding.amount < fee {
                return Err(WalletError::InsufficientFunds {
                    have: funding.amount,
                    need: fee,
                });
            }
            let mut tx = Transaction::new();
            tx.inputs.push(TxInput::new(funding.outpoint()));
            tx.outputs.push(TxOutput {
                value: amount,
                script_pubkey: colored_receiver.clone(),
            });
            append_change(&mut tx, issuer, funding.amount - fee, None)?;
            Ok((tx, ()))
        })?;
        let tx = self.finish(label, issuer, tx, fee, std::slice::from_ref(&funding))?;
        info!(%color_id, amount, "issued tokens");
        Ok(Issuance { tx, color_id })
    }

    fn issue_from_outpoint(
        &self,
        label: &'static str,
        issuer: &dyn WalletBackend,
        amount: u64,
        derive: fn(&OutPoint) -> ColorIdentifier,
    ) -> Result<Issuance, WalletError> {
        require_positive(amount)?;
        let receiver_script = issuer.receive_address()?;
        let utxos = issuer.list_unspent(self.only_finalized)?;

        let (tx, fee, color_id) = self.priced(|fee| {
            let funds = CoinSelector::select_uncolored(&utxos, fee)?;
            let mut tx = Transaction::new();
            append_inputs(&mut tx, &funds.selected);

            // Plain selection never succeeds empty, so input 0 exists.
            let color_id = derive(&tx.inputs[0].previous_output);
            tx.outputs.push(TxOutput {
                value: amount,
                script_pubkey: receiver_script.add_color(&color_id)?,
            });
            append_change(&mut tx, issuer, funds.total - fee, None)?;
            Ok((tx, color_id))
        })?;
        let tx = self.finish(label, issuer, tx, fee, &[])?;
        info!(%color_id, amount, "issued tokens");
        Ok(Issuance { tx, color_id })
    }

    /// Run `assemble` at the policy's fee.
    ///
    /// The fee is taken from the empty transaction first. Size-independent
    /// policies stop there. Size-sensitive ones are re-priced on the
    /// assembled transaction (with signature-sized unlocking data) and the
    /// transaction is rebuilt at the higher fee until the fee holds.
    fn priced<T>(
        &self,
        mut assemble: impl FnMut(u64) -> Result<(Transaction, T), WalletError>,
    ) -> Result<(Transaction, u64, T), WalletError> {
        let mut fee = self.fee_provider.fee(&Transaction::new());
        let (mut tx, mut extra) = assemble(fee)?;
        if !self.fee_provider.is_size_sensitive() {
            return Ok((tx, fee, extra));
        }

        for _ in 0..MAX_FEE_ROUNDS {
            let needed = self.fee_provider.fee(&with_placeholder_signatures(&tx));
            if needed <= fee {
                return Ok((tx, fee, extra));
            }
            debug!(fee, needed, inputs = tx.inputs.len(), "fee rose after assembly");
            fee = needed;
            (tx, extra) = assemble(fee)?;
        }
        Err(WalletError::FeeUnsettled { fee })
    }

    fn finish(
        &self,
        label: &'static str,
        wallet: &dyn WalletBackend,
        tx: Transaction,
        fee: u64,
        prev_outputs: &[PrevOutput],
    ) -> Result<Transaction, WalletError> {
        let inputs = tx.inputs.len();
        let outputs = tx.outputs.len();
        let signed = wallet.sign_tx(tx, prev_outputs)?;
        info!(inputs, outputs, fee, "built {label} transaction");
        Ok(signed)
    }
}

impl Default for TokenTxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Append one input per selected output, in selection order.
pub fn append_inputs(tx: &mut Transaction, outputs: &[UnspentOutput]) {
    tx.inputs
        .extend(outputs.iter().map(|utxo| TxInput::new(utxo.outpoint())));
}

/// Append a change output of exactly `change` to a fresh change script,
/// colored with `color_id` if given. A zero change appends nothing.
pub fn append_change(
    tx: &mut Transaction,
    wallet: &dyn WalletBackend,
    change: u64,
    color_id: Option<&ColorIdentifier>,
) -> Result<(), WalletError> {
    if change == 0 {
        return Ok(());
    }
    let plain = wallet.change_address()?;
    let script_pubkey = match color_id {
        Some(color) => plain.add_color(color)?,
        None => plain,
    };
    tx.outputs.push(TxOutput {
        value: change,
        script_pubkey,
    });
    Ok(())
}

/// Output 0 of a funding transaction, described for signing.
fn funding_output(funding_tx: &Transaction) -> Result<PrevOutput, WalletError> {
    let output = funding_tx
        .outputs
        .first()
        .ok_or_else(|| WalletError::InvalidFundingTransaction("no outputs".into()))?;
    if output.script_pubkey.is_colored() {
        return Err(WalletError::InvalidFundingTransaction(
            "output 0 is colored".into(),
        ));
    }
    Ok(PrevOutput {
        txid: funding_tx.txid()?,
        index: 0,
        script_pubkey: output.script_pubkey.clone(),
        amount: output.value,
    })
}

/// Copy of `tx` whose inputs carry unlocking data of signed length, for pricing.
fn with_placeholder_signatures(tx: &Transaction) -> Transaction {
    let mut sized = tx.clone();
    for input in &mut sized.inputs {
        input.script_sig = vec![0; SCRIPT_SIG_SIZE];
    }
    sized
}

fn require_positive(amount: u64) -> Result<(), WalletError> {
    if amount == 0 {
        return Err(WalletError::InvalidAmount("amount must be non-zero".into()));
    }
    Ok(())
}

fn checked_total(a: u64, b: u64) -> Result<u64, WalletError> {
    a.checked_add(b)
        .ok_or_else(|| WalletError::InvalidAmount("amount overflow".into()))
}
