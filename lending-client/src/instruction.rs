//! Instruction builders for the token-lending program.
//!
//! Only the *liquidate obligation* instruction is supported.  Its data is
//! nine bytes long: the [`LendingInstruction::LiquidateObligation`]
//! discriminant followed by the liquidity amount encoded as a little-endian
//! unsigned 64-bit integer.

use core::str::FromStr;

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::{Error, Result};

/// Address of the lending program on mainnet.
pub const LENDING_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("Port7uDYB3wk6GJAw4KT1WpTeMtSu9bTcChBHkX2LkR");

/// Address of the staking program whose accounts may be passed to
/// liquidation so that the staked collateral is updated as well.
pub const STAKING_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("stkarvwmSzv2BygN5e2LeTwimTczLWHCKPKGC2zVLiq");


/// Discriminants of the lending program’s instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LendingInstruction {
    InitLendingMarket = 0,
    SetLendingMarketOwner = 1,
    InitReserve = 2,
    RefreshReserve = 3,
    DepositReserveLiquidity = 4,
    RedeemReserveCollateral = 5,
    InitObligation = 6,
    RefreshObligation = 7,
    DepositObligationCollateral = 8,
    WithdrawObligationCollateral = 9,
    BorrowObligationLiquidity = 10,
    RepayObligationLiquidity = 11,
    LiquidateObligation = 12,
}


/// Stake account and staking pool passed to liquidation when the withdrawn
/// collateral is staked.
///
/// The two accounts are only meaningful together.  Use
/// [`StakingAccounts::from_options`] to pair up optional values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakingAccounts {
    pub stake_account: Pubkey,
    pub staking_pool: Pubkey,
}

impl StakingAccounts {
    /// Pairs optional staking pool and stake account.
    ///
    /// Returns `Ok(None)` if neither is given and [`Error::PartialStakingAccounts`]
    /// if only one is.
    pub fn from_options(
        staking_pool: Option<Pubkey>,
        stake_account: Option<Pubkey>,
    ) -> Result<Option<Self>> {
        match (staking_pool, stake_account) {
            (None, None) => Ok(None),
            (Some(staking_pool), Some(stake_account)) => {
                Ok(Some(Self { stake_account, staking_pool }))
            }
            _ => Err(Error::PartialStakingAccounts),
        }
    }

    fn metas(&self) -> [AccountMeta; 3] {
        [
            AccountMeta::new(self.stake_account, false),
            AccountMeta::new(self.staking_pool, false),
            AccountMeta::new_readonly(STAKING_PROGRAM_ID, false),
        ]
    }
}


/// Accounts every liquidation needs regardless of staking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidateAccounts {
    /// Token account the repaid liquidity is taken from.  Minted by the repay
    /// reserve liquidity mint; `transfer_authority` must be able to transfer
    /// the liquidity amount out of it.
    pub source_liquidity: Pubkey,
    /// Token account receiving the collateral.  Minted by the withdraw
    /// reserve collateral mint.
    pub destination_collateral: Pubkey,
    pub repay_reserve: Pubkey,
    pub repay_reserve_liquidity_supply: Pubkey,
    pub withdraw_reserve: Pubkey,
    pub withdraw_reserve_collateral_supply: Pubkey,
    pub obligation: Pubkey,
    pub lending_market: Pubkey,
    /// See [`lending_market_authority`].
    pub lending_market_authority: Pubkey,
    pub transfer_authority: Pubkey,
}


/// Repays borrowed liquidity of an unhealthy obligation in exchange for its
/// collateral at a discount.
///
/// The obligation and both reserves must be refreshed in the same
/// transaction before this instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidateObligation {
    pub liquidity_amount: u64,
    pub accounts: LiquidateAccounts,
    pub staking: Option<StakingAccounts>,
}

impl LiquidateObligation {
    /// Length of the instruction data.
    pub const DATA_LEN: usize = 9;

    /// Number of accounts passed when staking accounts are absent.
    pub const BASE_ACCOUNTS: usize = 12;

    /// Serialises instruction data.
    pub fn data(&self) -> [u8; Self::DATA_LEN] {
        let mut data = [0; Self::DATA_LEN];
        data[0] = LendingInstruction::LiquidateObligation as u8;
        data[1..].copy_from_slice(&self.liquidity_amount.to_le_bytes());
        data
    }

    /// Returns accounts in the order the lending program expects them.
    ///
    ///   0. `[writable]` Source liquidity token account.
    ///   1. `[writable]` Destination collateral token account.
    ///   2. `[writable]` Repay reserve account.
    ///   3. `[writable]` Repay reserve liquidity supply token account.
    ///   4. `[]` Withdraw reserve account.
    ///   5. `[writable]` Withdraw reserve collateral supply token account.
    ///   6. `[writable]` Obligation account.
    ///   7. `[]` Lending market account.
    ///   8. `[]` Derived lending market authority.
    ///   9. `[signer]` User transfer authority.
    ///  10. `[]` Clock sysvar.
    ///  11. `[]` Token program.
    ///
    /// With staking accounts three more follow:
    ///
    ///  12. `[writable]` Stake account.
    ///  13. `[writable]` Staking pool.
    ///  14. `[]` Staking program.
    pub fn accounts(&self) -> Vec<AccountMeta> {
        let accs = &self.accounts;
        let mut metas = Vec::with_capacity(Self::BASE_ACCOUNTS + 3);
        metas.extend([
            AccountMeta::new(accs.source_liquidity, false),
            AccountMeta::new(accs.destination_collateral, false),
            AccountMeta::new(accs.repay_reserve, false),
            AccountMeta::new(accs.repay_reserve_liquidity_supply, false),
            AccountMeta::new_readonly(accs.withdraw_reserve, false),
            AccountMeta::new(accs.withdraw_reserve_collateral_supply, false),
            AccountMeta::new(accs.obligation, false),
            AccountMeta::new_readonly(accs.lending_market, false),
            AccountMeta::new_readonly(accs.lending_market_authority, false),
            AccountMeta::new_readonly(accs.transfer_authority, true),
            AccountMeta::new_readonly(solana_program::sysvar::clock::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ]);
        if let Some(staking) = &self.staking {
            metas.extend(staking.metas());
        }
        metas
    }

    /// Builds the instruction calling `program_id`.
    pub fn instruction(&self, program_id: Pubkey) -> Instruction {
        Instruction {
            program_id,
            accounts: self.accounts(),
            data: self.data().to_vec(),
        }
    }

    /// Extracts liquidity amount from serialised instruction data.
    pub fn unpack_liquidity_amount(data: &[u8]) -> Result<u64> {
        match data.split_first() {
            Some((&tag, amount))
                if tag == LendingInstruction::LiquidateObligation as u8 =>
            {
                <[u8; 8]>::try_from(amount)
                    .map(u64::from_le_bytes)
                    .map_err(|_| Error::InvalidInstructionData)
            }
            _ => Err(Error::InvalidInstructionData),
        }
    }
}


/// Builds a liquidate obligation instruction.
///
/// `staking_pool` and `stake_account` must either both be given or both be
/// `None`; otherwise returns [`Error::PartialStakingAccounts`].
pub fn liquidate_obligation(
    program_id: Pubkey,
    liquidity_amount: u64,
    accounts: LiquidateAccounts,
    staking_pool: Option<Pubkey>,
    stake_account: Option<Pubkey>,
) -> Result<Instruction> {
    let staking = StakingAccounts::from_options(staking_pool, stake_account)?;
    let ix = LiquidateObligation { liquidity_amount, accounts, staking };
    Ok(ix.instruction(program_id))
}


/// Parses liquidity amount given as a decimal string.
///
/// Only plain non-negative integers which fit in `u64` are accepted.  Signs,
/// fractions and exponents are all rejected.
pub fn parse_liquidity_amount(amount: &str) -> Result<u64> {
    let invalid = || Error::InvalidAmount(amount.into());
    if amount.is_empty() || !amount.bytes().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid());
    }
    u64::from_str(amount).map_err(|_| invalid())
}


/// Returns the lending market authority, i.e. the PDA the lending program
/// signs with on behalf of `lending_market`.
pub fn lending_market_authority(
    lending_market: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(&[lending_market.as_ref()], program_id).0
}
