//! The parts of SPL governance accounts the client reads.
//!
//! Only the leading fields of each account are mirrored here; the trailing
//! reserved space is left undecoded.

use anchor_lang::prelude::*;
use spl_governance::state::enums::GovernanceAccountType;

use crate::error::{ClientError, Result};
use crate::fetch::{fetch_with, AccountSource, Fetched, RawAccount};

pub use spl_governance::state::token_owner_record::get_token_owner_record_address;

/// Denominator of `MintMaxVoterWeightSource::SupplyFraction`.
pub const SUPPLY_FRACTION_BASE: u64 = 10_000_000_000;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintMaxVoterWeightSource {
    /// Fraction of the mint supply, scaled by [`SUPPLY_FRACTION_BASE`].
    SupplyFraction(u64),
    Absolute(u64),
}

impl Default for MintMaxVoterWeightSource {
    fn default() -> Self {
        MintMaxVoterWeightSource::SupplyFraction(SUPPLY_FRACTION_BASE)
    }
}

impl MintMaxVoterWeightSource {
    pub fn max_voter_weight(&self, mint_supply: u64) -> Result<u64> {
        match *self {
            MintMaxVoterWeightSource::SupplyFraction(fraction) => {
                let weight = (mint_supply as u128)
                    .checked_mul(fraction as u128)
                    .ok_or(ClientError::MathOverflow)?
                    / SUPPLY_FRACTION_BASE as u128;
                u64::try_from(weight).map_err(|_| ClientError::MathOverflow)
            }
            MintMaxVoterWeightSource::Absolute(value) => Ok(value),
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RealmConfig {
    pub legacy1: u8,
    pub legacy2: u8,
    pub reserved: [u8; 6],
    pub min_community_weight_to_create_governance: u64,
    pub community_mint_max_voter_weight_source: MintMaxVoterWeightSource,
    pub council_mint: Option<Pubkey>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Realm {
    pub account_type: u8,
    pub community_mint: Pubkey,
    pub config: RealmConfig,
    pub reserved: [u8; 6],
    pub legacy1: u16,
    pub authority: Option<Pubkey>,
    pub name: String,
}

impl Realm {
    pub fn new(name: &str, community_mint: Pubkey, config: RealmConfig) -> Self {
        Self {
            account_type: GovernanceAccountType::RealmV2 as u8,
            community_mint,
            config,
            reserved: [0; 6],
            legacy1: 0,
            authority: None,
            name: name.to_string(),
        }
    }
}

/// A realm together with its address and the governance program owning it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealmAccount {
    pub pubkey: Pubkey,
    pub owner: Pubkey,
    pub account: Realm,
}

impl RealmAccount {
    pub fn governing_token_mint(&self, role: GovernanceRole) -> Option<Pubkey> {
        match role {
            GovernanceRole::Community => Some(self.account.community_mint),
            GovernanceRole::Council => self.account.config.council_mint,
        }
    }
}

/// Which of a realm's two governing mints a weight is computed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GovernanceRole {
    #[default]
    Community,
    Council,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenOwnerRecord {
    pub account_type: u8,
    pub realm: Pubkey,
    pub governing_token_mint: Pubkey,
    pub governing_token_owner: Pubkey,
    pub governing_token_deposit_amount: u64,
    pub unrelinquished_votes_count: u64,
    pub outstanding_proposal_count: u8,
    pub version: u8,
    pub reserved: [u8; 6],
    pub governance_delegate: Option<Pubkey>,
}

impl TokenOwnerRecord {
    pub fn new(realm: Pubkey, mint: Pubkey, owner: Pubkey, deposit_amount: u64) -> Self {
        Self {
            account_type: GovernanceAccountType::TokenOwnerRecordV2 as u8,
            realm,
            governing_token_mint: mint,
            governing_token_owner: owner,
            governing_token_deposit_amount: deposit_amount,
            unrelinquished_votes_count: 0,
            outstanding_proposal_count: 0,
            version: 1,
            reserved: [0; 6],
            governance_delegate: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenOwnerRecordAccount {
    pub pubkey: Pubkey,
    pub account: TokenOwnerRecord,
}

fn decode<T: AnchorDeserialize>(
    kind: &'static str,
    address: &Pubkey,
    data: &[u8],
    account_types: &[GovernanceAccountType],
) -> Result<T> {
    let account_type = *data
        .first()
        .ok_or_else(|| ClientError::decode(kind, *address, "empty account data"))?;
    if !account_types.iter().any(|t| t.clone() as u8 == account_type) {
        return Err(ClientError::decode(
            kind,
            *address,
            format!("unexpected account type {}", account_type),
        ));
    }
    T::deserialize(&mut &data[..]).map_err(|e| ClientError::decode(kind, *address, e))
}

pub fn decode_realm(address: &Pubkey, account: &RawAccount) -> Result<RealmAccount> {
    let realm = decode(
        "Realm",
        address,
        &account.data,
        &[GovernanceAccountType::RealmV1, GovernanceAccountType::RealmV2],
    )?;
    Ok(RealmAccount {
        pubkey: *address,
        owner: account.owner,
        account: realm,
    })
}

pub fn decode_token_owner_record(
    address: &Pubkey,
    account: &RawAccount,
) -> Result<TokenOwnerRecordAccount> {
    let mut record: TokenOwnerRecord = decode(
        "TokenOwnerRecord",
        address,
        &account.data,
        &[
            GovernanceAccountType::TokenOwnerRecordV1,
            GovernanceAccountType::TokenOwnerRecordV2,
        ],
    )?;
    // V1 stores the unrelinquished votes as a u32 followed by a u32 total
    // votes count.
    if record.account_type == GovernanceAccountType::TokenOwnerRecordV1 as u8 {
        record.unrelinquished_votes_count &= u32::MAX as u64;
    }
    Ok(TokenOwnerRecordAccount {
        pubkey: *address,
        account: record,
    })
}

pub async fn fetch_realm<S>(source: &S, realm: &Pubkey) -> Result<Fetched<RealmAccount>>
where
    S: AccountSource + ?Sized,
{
    fetch_with(source, realm, |account| decode_realm(realm, account)).await
}

pub async fn fetch_token_owner_record<S>(
    source: &S,
    address: &Pubkey,
) -> Result<Fetched<TokenOwnerRecordAccount>>
where
    S: AccountSource + ?Sized,
{
    fetch_with(source, address, |account| {
        decode_token_owner_record(address, account)
    })
    .await
}

/// Governing token deposit of `owner` in the realm, zero without a record.
pub async fn governing_token_deposit<S>(
    source: &S,
    realm: &RealmAccount,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<u64>
where
    S: AccountSource + ?Sized,
{
    let address = get_token_owner_record_address(&realm.owner, &realm.pubkey, mint, owner);
    Ok(fetch_token_owner_record(source, &address)
        .await?
        .found()
        .map_or(0, |record| record.account.governing_token_deposit_amount))
}

/// Token owner records delegating to `wallet` for `mint`.
pub fn delegators<'a>(
    records: &'a [TokenOwnerRecordAccount],
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Vec<&'a TokenOwnerRecordAccount> {
    records
        .iter()
        .filter(|record| {
            record.account.governance_delegate.as_ref() == Some(wallet)
                && record.account.governing_token_mint == *mint
        })
        .collect()
}
