//! Resolution of the token account an owner uses for a given mint.

use solana_program::pubkey::Pubkey;

use crate::layout::TokenAccount;
use crate::ledger::{Ledger, Wallet};
use crate::{send, token, Result};


/// Token account together with its address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyedTokenAccount {
    pub pubkey: Pubkey,
    pub account: TokenAccount,
}


/// Returns token account with the largest amount.
///
/// Accounts with equal amounts are ordered by address and the one with the
/// smallest address is chosen.  This makes the result independent of the
/// order in which the RPC node lists the accounts.
pub fn select_largest(
    accounts: impl IntoIterator<Item = KeyedTokenAccount>,
) -> Option<KeyedTokenAccount> {
    accounts.into_iter().max_by(|a, b| {
        a.account
            .amount
            .cmp(&b.account.amount)
            .then_with(|| b.pubkey.cmp(&a.pubkey))
    })
}


/// Finds `owner`’s token account for `mint` holding the most tokens.
///
/// If the owner has no such account, creates the associated token account
/// and returns it with zero amount.  In that case a transaction paid for
/// and signed by `owner` is submitted without waiting for confirmation, so
/// the account may not exist yet by the time this function returns.
///
/// Errors from the ledger are returned as is.
pub async fn find_largest_token_account_for_owner<L, W>(
    ledger: &L,
    owner: &W,
    mint: &Pubkey,
) -> Result<KeyedTokenAccount>
where
    L: Ledger + ?Sized,
    W: Wallet + ?Sized,
{
    let owner_key = owner.pubkey();
    let records = ledger.token_accounts_by_owner(&owner_key, mint).await?;
    let mut accounts = Vec::with_capacity(records.len());
    for (pubkey, data) in records {
        let account = TokenAccount::unpack(&data)?;
        if account.mint == *mint {
            accounts.push(KeyedTokenAccount { pubkey, account });
        } else {
            tracing::debug!(%pubkey, mint = %account.mint, "skipping account");
        }
    }
    if let Some(largest) = select_largest(accounts) {
        return Ok(largest);
    }

    let pubkey = token::associated_token_address(&owner_key, mint);
    tracing::info!(owner = %owner_key, %mint, %pubkey, "creating new token account");
    let ix = token::create_associated_token_account(&owner_key, &owner_key, mint);
    send::send_transaction(ledger, owner, &[ix], &[], false).await?;
    Ok(KeyedTokenAccount {
        pubkey,
        account: TokenAccount { mint: *mint, owner: owner_key, amount: 0 },
    })
}
