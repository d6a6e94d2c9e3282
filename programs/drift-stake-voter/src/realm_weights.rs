//! Voter weights of the connected wallet for a realm, combined across the
//! wallets that delegated their governance power to it.

use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};
use crate::fetch::AccountSource;
use crate::governance::{self, GovernanceRole, RealmAccount, TokenOwnerRecordAccount};
use crate::plugin::VoterWeightPlugin;
use crate::weights::{calculate_max_voter_weight, calculate_voter_weights, CalculatedWeight};

/// The delegator a user picked to vote on behalf of, per role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectedDelegators {
    pub community: Option<Pubkey>,
    pub council: Option<Pubkey>,
}

impl SelectedDelegators {
    pub fn for_role(&self, role: GovernanceRole) -> Option<Pubkey> {
        match role {
            GovernanceRole::Community => self.community,
            GovernanceRole::Council => self.council,
        }
    }
}

/// Wallets whose weight counts: the selected delegator, otherwise every
/// delegator, otherwise the connected wallet.
pub fn wallets_in_scope(
    selected_delegator: Option<Pubkey>,
    delegators: &[&TokenOwnerRecordAccount],
    wallet: Option<Pubkey>,
) -> Vec<Pubkey> {
    if let Some(selected) = selected_delegator {
        return vec![selected];
    }
    if !delegators.is_empty() {
        return delegators
            .iter()
            .map(|record| record.account.governing_token_owner)
            .collect();
    }
    wallet.into_iter().collect()
}

/// Combines per-wallet weights into one.
///
/// With a selected delegator, or without delegators, the first weight is the
/// total. Otherwise every delegator's deposit is added to the first weight
/// that has a value.
pub fn total_calculated_voter_weight(
    weights: &[CalculatedWeight],
    selected_delegator: Option<Pubkey>,
    delegators: &[&TokenOwnerRecordAccount],
) -> Result<Option<CalculatedWeight>> {
    let Some(first) = weights.first() else {
        return Ok(None);
    };
    if selected_delegator.is_some() || delegators.is_empty() {
        return Ok(Some(first.clone()));
    }

    let Some(base) = weights.iter().find(|weight| weight.value.is_some()) else {
        return Ok(Some(first.clone()));
    };
    let value = delegators
        .iter()
        .try_fold(base.value.unwrap_or_default(), |total, record| {
            total.checked_add(record.account.governing_token_deposit_amount)
        })
        .ok_or(ClientError::MathOverflow)?;
    Ok(Some(CalculatedWeight {
        value: Some(value),
        ..base.clone()
    }))
}

/// Weights for one role of a realm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RealmVoterWeight {
    pub role: GovernanceRole,
    /// `None` when the realm has no mint for the role.
    pub governing_token_mint: Option<Pubkey>,
    pub wallets: Vec<Pubkey>,
    pub calculated_voter_weights: Vec<CalculatedWeight>,
    pub total_calculated_voter_weight: Option<CalculatedWeight>,
    pub calculated_max_voter_weight: Option<CalculatedWeight>,
}

/// Computes the weights of `wallet` (or of the wallets delegating to it) for
/// `role`. `token_owner_records` are the realm's records known to the
/// caller; delegators are picked out of them.
pub async fn realm_voter_weight<S>(
    plugins: &[&dyn VoterWeightPlugin],
    source: &S,
    realm: &RealmAccount,
    role: GovernanceRole,
    wallet: Option<Pubkey>,
    selected_delegators: &SelectedDelegators,
    token_owner_records: &[TokenOwnerRecordAccount],
) -> Result<RealmVoterWeight>
where
    S: AccountSource + ?Sized,
{
    let Some(mint) = realm.governing_token_mint(role) else {
        return Ok(RealmVoterWeight {
            role,
            ..RealmVoterWeight::default()
        });
    };

    let selected = selected_delegators.for_role(role);
    let delegators = match wallet {
        Some(wallet) => governance::delegators(token_owner_records, &wallet, &mint),
        None => vec![],
    };
    let wallets = wallets_in_scope(selected, &delegators, wallet);

    let calculated_voter_weights =
        calculate_voter_weights(plugins, source, realm, &mint, &wallets).await?;
    let total_calculated_voter_weight =
        total_calculated_voter_weight(&calculated_voter_weights, selected, &delegators)?;
    let calculated_max_voter_weight =
        calculate_max_voter_weight(plugins, source, realm, &mint).await?;

    Ok(RealmVoterWeight {
        role,
        governing_token_mint: Some(mint),
        wallets,
        calculated_voter_weights,
        total_calculated_voter_weight,
        calculated_max_voter_weight: Some(calculated_max_voter_weight),
    })
}

/// The plugins configured for each governing mint of a realm. A plugin is
/// registered for one mint, so the two lists usually differ.
#[derive(Clone, Copy, Default)]
pub struct RealmPlugins<'a> {
    pub community: &'a [&'a dyn VoterWeightPlugin],
    pub council: &'a [&'a dyn VoterWeightPlugin],
}

impl<'a> RealmPlugins<'a> {
    pub fn for_role(&self, role: GovernanceRole) -> &'a [&'a dyn VoterWeightPlugin] {
        match role {
            GovernanceRole::Community => self.community,
            GovernanceRole::Council => self.council,
        }
    }
}

/// Community and council weights side by side, for when the role is not
/// known yet (e.g. when creating a proposal).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RealmVoterWeights {
    pub community: RealmVoterWeight,
    pub council: RealmVoterWeight,
}

impl RealmVoterWeights {
    pub fn community_weight(&self) -> Option<&CalculatedWeight> {
        self.community.total_calculated_voter_weight.as_ref()
    }

    pub fn council_weight(&self) -> Option<&CalculatedWeight> {
        self.council.total_calculated_voter_weight.as_ref()
    }

    pub fn community_max_weight(&self) -> Option<&CalculatedWeight> {
        self.community.calculated_max_voter_weight.as_ref()
    }

    pub fn council_max_weight(&self) -> Option<&CalculatedWeight> {
        self.council.calculated_max_voter_weight.as_ref()
    }
}

pub async fn realm_voter_weights<S>(
    plugins: &RealmPlugins<'_>,
    source: &S,
    realm: &RealmAccount,
    wallet: Option<Pubkey>,
    selected_delegators: &SelectedDelegators,
    token_owner_records: &[TokenOwnerRecordAccount],
) -> Result<RealmVoterWeights>
where
    S: AccountSource + ?Sized,
{
    let community = realm_voter_weight(
        plugins.for_role(GovernanceRole::Community),
        source,
        realm,
        GovernanceRole::Community,
        wallet,
        selected_delegators,
        token_owner_records,
    )
    .await?;
    let council = realm_voter_weight(
        plugins.for_role(GovernanceRole::Council),
        source,
        realm,
        GovernanceRole::Council,
        wallet,
        selected_delegators,
        token_owner_records,
    )
    .await?;
    Ok(RealmVoterWeights { community, council })
}
