//! Read-only views of the Drift accounts the addin looks at, their
//! addresses, and the share accounting used to value an insurance fund stake.
//!
//! Drift stores these accounts zero-copy. The views below keep every field as
//! a little-endian byte array so the structs have an alignment of one and can
//! be cast straight out of account data.

use std::mem::size_of;

use anchor_lang::solana_program::hash::hash;
use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};

pub const SPOT_MARKET_SEED: &[u8] = b"spot_market";
pub const INSURANCE_FUND_VAULT_SEED: &[u8] = b"insurance_fund_vault";
pub const INSURANCE_FUND_STAKE_SEED: &[u8] = b"insurance_fund_stake";

pub fn spot_market_address(drift_program_id: &Pubkey, market_index: u16) -> Pubkey {
    Pubkey::find_program_address(
        &[SPOT_MARKET_SEED, &market_index.to_le_bytes()],
        drift_program_id,
    )
    .0
}

pub fn insurance_fund_vault_address(drift_program_id: &Pubkey, market_index: u16) -> Pubkey {
    Pubkey::find_program_address(
        &[INSURANCE_FUND_VAULT_SEED, &market_index.to_le_bytes()],
        drift_program_id,
    )
    .0
}

pub fn insurance_fund_stake_address(
    drift_program_id: &Pubkey,
    authority: &Pubkey,
    market_index: u16,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            INSURANCE_FUND_STAKE_SEED,
            authority.as_ref(),
            &market_index.to_le_bytes(),
        ],
        drift_program_id,
    )
    .0
}

/// A Drift account stored zero-copy behind an 8 byte Anchor discriminator.
pub trait DriftAccount: Pod {
    const NAME: &'static str;

    /// `sha256("account:<NAME>")[..8]`
    fn discriminator() -> [u8; 8] {
        let mut discriminator = [0u8; 8];
        let preimage = format!("account:{}", Self::NAME);
        discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
        discriminator
    }

    /// Reads the view from the start of the account data. Trailing data the
    /// view does not cover is ignored.
    fn load(address: &Pubkey, data: &[u8]) -> Result<Self> {
        let end = 8 + size_of::<Self>();
        if data.len() < end {
            return Err(ClientError::decode(
                Self::NAME,
                *address,
                format!("account data too small: {} < {}", data.len(), end),
            ));
        }
        if data[..8] != Self::discriminator() {
            return Err(ClientError::decode(
                Self::NAME,
                *address,
                "discriminator mismatch",
            ));
        }
        bytemuck::try_pod_read_unaligned(&data[8..end])
            .map_err(|e| ClientError::decode(Self::NAME, *address, e))
    }

    /// Discriminator followed by the view, as Drift lays the account out.
    fn to_account_data(&self) -> Vec<u8> {
        let mut data = Self::discriminator().to_vec();
        data.extend_from_slice(bytemuck::bytes_of(self));
        data
    }
}

/// A voter's stake in one spot market's insurance fund.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct InsuranceFundStake {
    pub authority: Pubkey,
    if_shares: [u8; 16],
    last_withdraw_request_shares: [u8; 16],
    _if_base: [u8; 16],
    _last_valid_ts: [u8; 8],
    last_withdraw_request_value: [u8; 8],
    last_withdraw_request_ts: [u8; 8],
    _cost_basis: [u8; 8],
    market_index: [u8; 2],
    _padding: [u8; 14],
}

impl DriftAccount for InsuranceFundStake {
    const NAME: &'static str = "InsuranceFundStake";
}

impl InsuranceFundStake {
    pub fn new(authority: Pubkey, market_index: u16) -> Self {
        Self {
            authority,
            market_index: market_index.to_le_bytes(),
            ..Self::default()
        }
    }

    pub fn if_shares(&self) -> u128 {
        u128::from_le_bytes(self.if_shares)
    }

    pub fn last_withdraw_request_shares(&self) -> u128 {
        u128::from_le_bytes(self.last_withdraw_request_shares)
    }

    pub fn last_withdraw_request_value(&self) -> u64 {
        u64::from_le_bytes(self.last_withdraw_request_value)
    }

    pub fn last_withdraw_request_ts(&self) -> i64 {
        i64::from_le_bytes(self.last_withdraw_request_ts)
    }

    pub fn market_index(&self) -> u16 {
        u16::from_le_bytes(self.market_index)
    }

    pub fn with_shares(mut self, if_shares: u128) -> Self {
        self.if_shares = if_shares.to_le_bytes();
        self
    }

    pub fn with_withdraw_request(mut self, shares: u128, value: u64, ts: i64) -> Self {
        self.last_withdraw_request_shares = shares.to_le_bytes();
        self.last_withdraw_request_value = value.to_le_bytes();
        self.last_withdraw_request_ts = ts.to_le_bytes();
        self
    }

    /// Token value of this stake given the market's insurance fund and vault.
    pub fn amount(&self, insurance_fund: &InsuranceFund, vault_balance: u64) -> Result<u128> {
        unstake_shares_to_amount_with_open_request(
            self.if_shares(),
            self.last_withdraw_request_shares(),
            self.last_withdraw_request_value(),
            insurance_fund.total_shares(),
            vault_balance,
        )
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct InsuranceFund {
    pub vault: Pubkey,
    total_shares: [u8; 16],
    _user_shares: [u8; 16],
    _shares_base: [u8; 16],
    _unstaking_period: [u8; 8],
    _last_revenue_settle_ts: [u8; 8],
    _revenue_settle_period: [u8; 8],
    _total_factor: [u8; 4],
    _user_factor: [u8; 4],
}

impl InsuranceFund {
    pub fn new(vault: Pubkey, total_shares: u128) -> Self {
        Self {
            vault,
            total_shares: total_shares.to_le_bytes(),
            ..Self::default()
        }
    }

    pub fn total_shares(&self) -> u128 {
        u128::from_le_bytes(self.total_shares)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PoolBalance {
    _scaled_balance: [u8; 16],
    _market_index: [u8; 2],
    _padding: [u8; 6],
}

/// Leading part of a Drift `SpotMarket`, up to and including its insurance
/// fund. The remaining fields are not needed to value a stake.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct SpotMarket {
    pub pubkey: Pubkey,
    pub oracle: Pubkey,
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub name: [u8; 32],
    _historical_oracle_data: [u8; 48],
    // 40 bytes, split so that bytemuck derives for it.
    _historical_index_data: [u8; 32],
    _historical_index_data_end: [u8; 8],
    pub revenue_pool: PoolBalance,
    pub spot_fee_pool: PoolBalance,
    pub insurance_fund: InsuranceFund,
}

impl DriftAccount for SpotMarket {
    const NAME: &'static str = "SpotMarket";
}

impl SpotMarket {
    pub fn new(pubkey: Pubkey, mint: Pubkey, insurance_fund: InsuranceFund) -> Self {
        Self {
            pubkey,
            mint,
            insurance_fund,
            ..Self::zeroed()
        }
    }
}

/// Converts insurance fund shares to a token amount.
///
/// Shares not covered by the open withdraw request are worth their pro-rata
/// slice of the current vault balance. Shares under the request are worth
/// `withdraw_request_value`, fixed when the request was made.
///
/// Returns zero when either `shares` or `total_shares` is zero.
pub fn unstake_shares_to_amount_with_open_request(
    shares: u128,
    withdraw_request_shares: u128,
    withdraw_request_value: u64,
    total_shares: u128,
    vault_balance: u64,
) -> Result<u128> {
    if shares == 0 || total_shares == 0 {
        return Ok(0);
    }

    let staked_amount = shares
        .saturating_sub(withdraw_request_shares)
        .checked_mul(vault_balance as u128)
        .ok_or(ClientError::MathOverflow)?
        / total_shares;

    staked_amount
        .checked_add(withdraw_request_value as u128)
        .ok_or(ClientError::MathOverflow)
}
