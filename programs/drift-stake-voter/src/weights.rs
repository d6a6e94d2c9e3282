//! Runs a realm's chain of voter weight plugins for a set of wallets.

use anchor_spl::token::{self, Mint};
use log::warn;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};
use crate::fetch::{fetch_anchor, AccountSource};
use crate::governance::{fetch_realm, governing_token_deposit, RealmAccount};
use crate::plugin::{UpdateVoterWeightInstructions, VoterWeightPlugin};

/// What one plugin did to the weight passing through it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginWeight {
    Computed {
        plugin: String,
        input: u64,
        output: u64,
    },
    Failed {
        plugin: String,
        error: String,
    },
}

/// A weight computed through the plugin chain. `value` is `None` when a
/// plugin failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CalculatedWeight {
    pub value: Option<u64>,
    pub initial_value: Option<u64>,
    pub details: Vec<PluginWeight>,
}

impl CalculatedWeight {
    pub fn fixed(value: u64) -> Self {
        Self {
            value: Some(value),
            initial_value: Some(value),
            details: vec![],
        }
    }

    /// Records the outcome of one plugin. Returns `false` once the chain is
    /// broken and later plugins must not run.
    fn apply(&mut self, plugin: &str, result: Result<u64>) -> bool {
        let Some(input) = self.value else {
            return false;
        };
        match result {
            Ok(output) => {
                self.details.push(PluginWeight::Computed {
                    plugin: plugin.to_string(),
                    input,
                    output,
                });
                self.value = Some(output);
                true
            }
            Err(error) => {
                warn!("voter weight plugin {} failed: {}", plugin, error);
                self.details.push(PluginWeight::Failed {
                    plugin: plugin.to_string(),
                    error: error.to_string(),
                });
                self.value = None;
                false
            }
        }
    }
}

/// Voter weight of each wallet, in the order given. Each chain starts from
/// the wallet's governing token deposit in the realm.
pub async fn calculate_voter_weights<S>(
    plugins: &[&dyn VoterWeightPlugin],
    source: &S,
    realm: &RealmAccount,
    mint: &Pubkey,
    wallets: &[Pubkey],
) -> Result<Vec<CalculatedWeight>>
where
    S: AccountSource + ?Sized,
{
    let mut weights = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        let deposit = governing_token_deposit(source, realm, mint, wallet).await?;
        let mut weight = CalculatedWeight::fixed(deposit);
        for plugin in plugins {
            let input = weight.value.unwrap_or_default();
            let result = plugin
                .calculate_voter_weight(wallet, &realm.pubkey, mint, input)
                .await;
            if !weight.apply(plugin.name(), result) {
                break;
            }
        }
        weights.push(weight);
    }
    Ok(weights)
}

/// Max voter weight of a governing mint. Starts from the mint supply (scaled
/// by the realm's max voter weight source for the community mint); only
/// plugins with the max voter weight capability take part.
pub async fn calculate_max_voter_weight<S>(
    plugins: &[&dyn VoterWeightPlugin],
    source: &S,
    realm: &RealmAccount,
    mint: &Pubkey,
) -> Result<CalculatedWeight>
where
    S: AccountSource + ?Sized,
{
    let supply = fetch_anchor::<Mint, _>(source, "Mint", mint, &token::ID)
        .await?
        .require("Mint", *mint)?
        .supply;
    // The max voter weight source only scales the community mint.
    let initial = if *mint == realm.account.community_mint {
        realm
            .account
            .config
            .community_mint_max_voter_weight_source
            .max_voter_weight(supply)?
    } else {
        supply
    };

    let mut weight = CalculatedWeight::fixed(initial);
    for plugin in plugins {
        // Plugins without the capability do not take part.
        let Some(max) = plugin.max_voter_weight() else {
            continue;
        };
        let input = weight.value.unwrap_or_default();
        let result = max
            .calculate_max_voter_weight(&realm.pubkey, mint, input)
            .await;
        if !weight.apply(plugin.name(), result) {
            break;
        }
    }
    Ok(weight)
}

/// Every plugin's update instructions for `voter`, in chain order.
pub async fn update_voter_weight_instructions(
    plugins: &[&dyn VoterWeightPlugin],
    voter: &Pubkey,
    realm: &Pubkey,
    mint: &Pubkey,
) -> Result<UpdateVoterWeightInstructions> {
    let mut instructions = UpdateVoterWeightInstructions::default();
    for plugin in plugins {
        instructions.extend(plugin.update_voter_weight_record(voter, realm, mint).await?);
    }
    Ok(instructions)
}

/// Instructions creating every plugin's voter weight record for `voter`.
pub async fn create_voter_weight_records(
    plugins: &[&dyn VoterWeightPlugin],
    voter: &Pubkey,
    realm: &Pubkey,
    mint: &Pubkey,
) -> Result<Vec<Instruction>> {
    let mut instructions = vec![];
    for plugin in plugins {
        if let Some(ix) = plugin.create_voter_weight_record(voter, realm, mint).await? {
            instructions.push(ix);
        }
    }
    Ok(instructions)
}

/// Loads the realm and runs [`calculate_voter_weights`].
pub async fn calculate_realm_voter_weights<S>(
    plugins: &[&dyn VoterWeightPlugin],
    source: &S,
    realm: &Pubkey,
    mint: &Pubkey,
    wallets: &[Pubkey],
) -> Result<Vec<CalculatedWeight>>
where
    S: AccountSource + ?Sized,
{
    let realm = fetch_realm(source, realm)
        .await?
        .found()
        .ok_or(ClientError::RealmNotFound(*realm))?;
    calculate_voter_weights(plugins, source, &realm, mint, wallets).await
}
