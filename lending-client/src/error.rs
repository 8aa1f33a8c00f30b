use solana_program::program_error::ProgramError;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::TransactionError;

use crate::layout::TokenAccount;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;


/// Errors returned by the helpers in this crate.
///
/// Input validation errors are always reported before anything is sent to
/// the network.  Errors coming from the RPC node are passed through as they
/// are; nothing in this crate retries.
#[derive(Debug, derive_more::Display, derive_more::From, derive_more::Error)]
pub enum Error {
    /// Amount is not an integer in `0..=u64::MAX`.
    #[display("invalid liquidity amount: {_0:?}")]
    InvalidAmount(#[error(not(source))] String),

    /// Only one of staking pool and stake account was given.
    #[display("staking pool and stake account must be given together")]
    PartialStakingAccounts,

    /// Instruction data has unexpected length or discriminant.
    #[display("invalid instruction data")]
    InvalidInstructionData,

    /// Token account record is shorter than [`TokenAccount::LEN`].
    #[display(
        "token account data too short: {_0} < {} bytes",
        TokenAccount::LEN
    )]
    AccountDataTooShort(#[error(not(source))] usize),

    /// RPC node returned account data in an encoding other than base64 or
    /// base58.
    #[display("undecodable data of account {_0}")]
    UndecodableAccountData(#[error(not(source))] Pubkey),

    /// RPC node returned a malformed address.
    #[display("invalid pubkey: {_0}")]
    #[from]
    InvalidPubkey(ParsePubkeyError),

    /// Not every required signer signed the transaction.
    #[display("transaction is missing required signatures")]
    MissingSignatures,

    /// Transaction was included but failed.
    #[display("transaction {_0} failed: {_1}")]
    Rejected(Signature, TransactionError),

    /// Blockhash expired before the transaction got confirmed.
    #[display("transaction {_0} expired before confirmation")]
    Expired(#[error(not(source))] Signature),

    #[cfg(feature = "rpc")]
    #[from]
    Client(solana_client::client_error::ClientError),

    #[from]
    Signer(SignerError),

    #[from]
    Program(ProgramError),
}
