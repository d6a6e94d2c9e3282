use anchor_lang::prelude::*;

/// Realm-scoped configuration of the addin: which Drift program and spot
/// market back the voting weight for `governing_token_mint`.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Registrar {
    pub governance_program_id: Pubkey,
    pub realm: Pubkey,
    pub governing_token_mint: Pubkey,
    pub drift_program_id: Pubkey,
    pub spot_market_index: u16,
}

/// The governance action a voter weight was evaluated for.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoterWeightAction {
    CastVote,
    CommentProposal,
    CreateGovernance,
    CreateProposal,
    SignOffProposal,
}

/// The record SPL governance reads a voter's weight from. It is defined by
/// the governance addin interface but owned by this addin.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VoterWeightRecord {
    pub realm: Pubkey,
    pub governing_token_mint: Pubkey,
    pub governing_token_owner: Pubkey,
    pub voter_weight: u64,
    /// Slot after which the weight must be refreshed. The addin sets it to
    /// the slot of the update, so the update has to share a transaction with
    /// the governance instruction.
    pub voter_weight_expiry: Option<u64>,
    pub weight_action: Option<VoterWeightAction>,
    pub weight_action_target: Option<Pubkey>,
    pub reserved: [u8; 8],
}

impl VoterWeightRecord {
    pub fn is_expired(&self, slot: u64) -> bool {
        self.voter_weight_expiry
            .map_or(false, |expiry| expiry < slot)
    }
}
