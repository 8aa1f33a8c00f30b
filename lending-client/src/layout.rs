//! Parsing of SPL token account records.

use solana_program::pubkey::Pubkey;

use crate::{Error, Result};

const MINT_OFFSET: usize = 0;
const OWNER_OFFSET: usize = 32;
const AMOUNT_OFFSET: usize = 64;


/// The part of an SPL token account this crate cares about.
///
/// Records are [`TokenAccount::LEN`] bytes long: mint, owner and amount
/// followed by delegate, state, native and close authority fields which are
/// left uninterpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccount {
    /// Size of an SPL token account.
    pub const LEN: usize = 165;

    /// Parses a raw token account record.
    ///
    /// Bytes past [`TokenAccount::LEN`] (such as token-2022 extensions) are
    /// ignored.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        let data: &[u8; Self::LEN] = data
            .get(..Self::LEN)
            .and_then(|data| data.try_into().ok())
            .ok_or(Error::AccountDataTooShort(data.len()))?;
        Ok(Self {
            mint: Pubkey::new_from_array(field(data, MINT_OFFSET)),
            owner: Pubkey::new_from_array(field(data, OWNER_OFFSET)),
            amount: u64::from_le_bytes(field(data, AMOUNT_OFFSET)),
        })
    }

    /// Serialises the record.  Fields not covered by this type are zeroed.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut data = [0; Self::LEN];
        data[MINT_OFFSET..OWNER_OFFSET].copy_from_slice(self.mint.as_ref());
        data[OWNER_OFFSET..AMOUNT_OFFSET].copy_from_slice(self.owner.as_ref());
        data[AMOUNT_OFFSET..AMOUNT_OFFSET + 8]
            .copy_from_slice(&self.amount.to_le_bytes());
        data
    }
}

fn field<const N: usize>(
    data: &[u8; TokenAccount::LEN],
    offset: usize,
) -> [u8; N] {
    let mut buf = [0; N];
    buf.copy_from_slice(&data[offset..offset + N]);
    buf
}
