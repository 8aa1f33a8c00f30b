//! Assembling, signing and submitting transactions.

use solana_program::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;

use crate::ledger::{Ledger, Wallet};
use crate::{Error, Result};


/// Sends a transaction executing `instructions` with `wallet` as fee payer.
///
/// The transaction is signed by `signers` (for example keypairs of accounts
/// created by [`crate::token::create_token_account`]) and then by the
/// wallet.  If any required signature is still missing afterwards, returns
/// [`Error::MissingSignatures`] without submitting anything.
///
/// The transaction is submitted with preflight checks skipped so malformed
/// transactions are only detected once they land.  If `confirm` is false,
/// returns as soon as the node accepts the transaction.  Otherwise waits
/// until it’s confirmed and reports failure of the transaction as
/// [`Error::Rejected`].
pub async fn send_transaction<L, W>(
    ledger: &L,
    wallet: &W,
    instructions: &[Instruction],
    signers: &[Keypair],
    confirm: bool,
) -> Result<Signature>
where
    L: Ledger + ?Sized,
    W: Wallet + ?Sized,
{
    let blockhash = ledger.latest_blockhash().await?;
    let message = Message::new_with_blockhash(
        instructions,
        Some(&wallet.pubkey()),
        &blockhash,
    );
    let mut tx = Transaction::new_unsigned(message);
    if !signers.is_empty() {
        let signers = signers.iter().collect::<Vec<_>>();
        tx.try_partial_sign(&signers, blockhash)?;
    }
    let tx = wallet.sign_transaction(tx).await?;
    if !tx.is_signed() {
        return Err(Error::MissingSignatures);
    }

    let signature = ledger.send_transaction(&tx).await?;
    tracing::debug!(%signature, confirm, "sent transaction");
    if confirm {
        ledger.confirm_transaction(&signature, &blockhash).await?;
        tracing::debug!(%signature, "transaction confirmed");
    }
    Ok(signature)
}
