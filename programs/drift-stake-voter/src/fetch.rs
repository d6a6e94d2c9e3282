use std::sync::Arc;

use anchor_lang::AccountDeserialize;
use async_trait::async_trait;
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};

/// Owner and data of an on-chain account, as returned by an [`AccountSource`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawAccount {
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn check_owner(
        &self,
        kind: &'static str,
        address: &Pubkey,
        expected: &Pubkey,
    ) -> Result<()> {
        if self.owner != *expected {
            return Err(ClientError::InvalidOwner {
                kind,
                address: *address,
                owner: self.owner,
                expected: *expected,
            });
        }
        Ok(())
    }
}

/// Anything that can look up accounts by address: an RPC connection, a bank
/// in tests, a query cache.
///
/// `Ok(None)` means the account does not exist. Transport failures must be
/// reported as `Err` so that they are never mistaken for an absent account.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>>;
}

#[async_trait]
impl<S: AccountSource + ?Sized> AccountSource for Arc<S> {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>> {
        (**self).get_account(address).await
    }
}

#[async_trait]
impl<S: AccountSource + ?Sized> AccountSource for &S {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>> {
        (**self).get_account(address).await
    }
}

/// Result of a typed account fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl<T> Fetched<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Fetched::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Found(value) => Fetched::Found(f(value)),
            Fetched::NotFound => Fetched::NotFound,
        }
    }

    /// Turns an absent account into [`ClientError::AccountNotFound`].
    pub fn require(self, kind: &'static str, address: Pubkey) -> Result<T> {
        self.found()
            .ok_or(ClientError::AccountNotFound { kind, address })
    }
}

/// Fetches and decodes an account owned by `owner` with its Anchor (or
/// Anchor-compatible) deserializer, which also checks the discriminator.
pub async fn fetch_anchor<T, S>(
    source: &S,
    kind: &'static str,
    address: &Pubkey,
    owner: &Pubkey,
) -> Result<Fetched<T>>
where
    T: AccountDeserialize,
    S: AccountSource + ?Sized,
{
    let Some(account) = source.get_account(address).await? else {
        return Ok(Fetched::NotFound);
    };
    account.check_owner(kind, address, owner)?;
    let value = T::try_deserialize(&mut account.data.as_slice())
        .map_err(|e| ClientError::decode(kind, *address, e))?;
    Ok(Fetched::Found(value))
}

/// Fetches an account and decodes it with `decode`, which receives the
/// account owner and data.
pub async fn fetch_with<T, S, F>(source: &S, address: &Pubkey, decode: F) -> Result<Fetched<T>>
where
    S: AccountSource + ?Sized,
    F: FnOnce(&RawAccount) -> Result<T>,
{
    match source.get_account(address).await? {
        Some(account) => decode(&account).map(Fetched::Found),
        None => Ok(Fetched::NotFound),
    }
}
