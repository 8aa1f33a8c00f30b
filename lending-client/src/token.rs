//! Instructions creating SPL token accounts.

use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

use crate::layout::TokenAccount;
use crate::Result;


/// Returns address of the associated token account of `owner` for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account_client::address::get_associated_token_address_with_program_id(
        owner,
        mint,
        &spl_token::ID,
    )
}

/// Builds instruction creating the associated token account of `owner` for
/// `mint`, paid for by `payer`.
pub fn create_associated_token_account(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    spl_associated_token_account_client::instruction::create_associated_token_account(
        payer,
        owner,
        mint,
        &spl_token::ID,
    )
}


/// Adds instruction allocating a new token-program-owned account of
/// [`TokenAccount::LEN`] bytes funded with `lamports` by `payer`.
///
/// The account’s keypair is generated here and pushed onto `signers`; the
/// transaction must be signed with it.  Returns address of the new account.
pub fn create_uninitialized_account(
    instructions: &mut Vec<Instruction>,
    payer: &Pubkey,
    lamports: u64,
    signers: &mut Vec<Keypair>,
) -> Pubkey {
    let account = Keypair::new();
    let address = account.pubkey();
    instructions.push(solana_system_interface::instruction::create_account(
        payer,
        &address,
        lamports,
        TokenAccount::LEN as u64,
        &spl_token::ID,
    ));
    signers.push(account);
    address
}

/// Adds instructions creating and initialising a token account holding
/// `mint` owned by `owner`.
///
/// `lamports` should cover rent exemption of [`TokenAccount::LEN`] bytes.
/// Like [`create_uninitialized_account`], pushes the new account’s keypair
/// onto `signers` and returns its address.
pub fn create_token_account(
    instructions: &mut Vec<Instruction>,
    payer: &Pubkey,
    lamports: u64,
    mint: &Pubkey,
    owner: &Pubkey,
    signers: &mut Vec<Keypair>,
) -> Result<Pubkey> {
    let account =
        create_uninitialized_account(instructions, payer, lamports, signers);
    instructions.push(spl_token::instruction::initialize_account(
        &spl_token::ID,
        &account,
        mint,
        owner,
    )?);
    Ok(account)
}
