use async_trait::async_trait;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::error::Result;

/// Instructions to run around a governance instruction so that the voter
/// weight record it reads is up to date.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateVoterWeightInstructions {
    /// Must run before the governance instruction, in the same transaction.
    pub pre: Vec<Instruction>,
    pub post: Vec<Instruction>,
}

impl UpdateVoterWeightInstructions {
    pub fn extend(&mut self, other: UpdateVoterWeightInstructions) {
        self.pre.extend(other.pre);
        self.post.extend(other.post);
    }
}

/// What a plugin can do beyond computing a voter weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PluginCapabilities {
    pub max_voter_weight: bool,
}

/// A voter weight plugin, as seen from the client.
///
/// Plugins are chained: each receives the weight computed by the previous
/// one (or the governance deposit for the first) as `input_voter_weight`.
#[async_trait]
pub trait VoterWeightPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn program_id(&self) -> Pubkey;

    /// Whether the plugin builds on the weight handed to it rather than
    /// replacing it.
    fn requires_input_voter_weight(&self) -> bool;

    async fn calculate_voter_weight(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
        input_voter_weight: u64,
    ) -> Result<u64>;

    async fn update_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<UpdateVoterWeightInstructions>;

    /// `None` when the record needs no creating.
    async fn create_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<Instruction>>;

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            max_voter_weight: self.max_voter_weight().is_some(),
        }
    }

    /// The max voter weight side of the plugin, if it has one.
    fn max_voter_weight(&self) -> Option<&dyn MaxVoterWeightPlugin> {
        None
    }
}

/// Plugins that also bound the total weight of a governing mint.
#[async_trait]
pub trait MaxVoterWeightPlugin: Send + Sync {
    async fn calculate_max_voter_weight(
        &self,
        realm: &Pubkey,
        mint: &Pubkey,
        input_max_voter_weight: u64,
    ) -> Result<u64>;

    async fn create_max_voter_weight_record(
        &self,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<Instruction>>;

    async fn update_max_voter_weight_record(
        &self,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<Instruction>>;
}
