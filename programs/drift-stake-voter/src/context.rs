//! Accounts and data of the addin instructions the client assembles.

use anchor_lang::prelude::*;
use anchor_lang::{Discriminator, InstructionData};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::system_program;

pub const REGISTRAR: [u8; 9] = *b"registrar";
pub const VOTER_WEIGHT_RECORD: [u8; 19] = *b"voter-weight-record";

pub fn registrar_address(program_id: &Pubkey, realm: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[REGISTRAR.as_ref(), realm.as_ref(), mint.as_ref()],
        program_id,
    )
}

pub fn voter_weight_record_address(
    program_id: &Pubkey,
    realm: &Pubkey,
    mint: &Pubkey,
    voter: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            VOTER_WEIGHT_RECORD.as_ref(),
            realm.as_ref(),
            mint.as_ref(),
            voter.as_ref(),
        ],
        program_id,
    )
}

pub mod instruction {
    use super::*;

    #[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
    pub struct CreateVoterWeightRecord {
        pub voter: Pubkey,
    }

    impl Discriminator for CreateVoterWeightRecord {
        const DISCRIMINATOR: [u8; 8] = [184, 249, 133, 178, 88, 152, 250, 186];
    }

    impl InstructionData for CreateVoterWeightRecord {}

    #[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
    pub struct UpdateVoterWeightRecord {}

    impl Discriminator for UpdateVoterWeightRecord {
        const DISCRIMINATOR: [u8; 8] = [45, 185, 3, 36, 109, 190, 115, 169];
    }

    impl InstructionData for UpdateVoterWeightRecord {}
}

pub mod accounts {
    use super::*;

    pub struct CreateVoterWeightRecord {
        pub voter_weight_record: Pubkey,
        pub registrar: Pubkey,
        pub payer: Pubkey,
        pub system_program: Pubkey,
    }

    impl ToAccountMetas for CreateVoterWeightRecord {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            vec![
                AccountMeta::new(self.voter_weight_record, false),
                AccountMeta::new_readonly(self.registrar, false),
                AccountMeta::new(self.payer, true),
                AccountMeta::new_readonly(self.system_program, false),
            ]
        }
    }

    pub struct UpdateVoterWeightRecord {
        pub voter_weight_record: Pubkey,
        pub registrar: Pubkey,
        pub drift_program: Pubkey,
        pub spot_market: Pubkey,
        /// `None` when the voter never staked. The addin then counts no stake.
        pub insurance_fund_stake: Option<Pubkey>,
        pub insurance_fund_vault: Pubkey,
        pub token_owner_record: Pubkey,
    }

    impl ToAccountMetas for UpdateVoterWeightRecord {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            vec![
                AccountMeta::new(self.voter_weight_record, false),
                AccountMeta::new_readonly(self.registrar, false),
                AccountMeta::new_readonly(self.drift_program, false),
                AccountMeta::new_readonly(self.spot_market, false),
                // Anchor passes the program's own id for an absent optional account.
                AccountMeta::new_readonly(self.insurance_fund_stake.unwrap_or(crate::ID), false),
                AccountMeta::new_readonly(self.insurance_fund_vault, false),
                AccountMeta::new_readonly(self.token_owner_record, false),
            ]
        }
    }
}

pub fn create_voter_weight_record(
    program_id: &Pubkey,
    realm: &Pubkey,
    mint: &Pubkey,
    voter: &Pubkey,
) -> Instruction {
    let (voter_weight_record, _) = voter_weight_record_address(program_id, realm, mint, voter);
    let (registrar, _) = registrar_address(program_id, realm, mint);

    Instruction {
        program_id: *program_id,
        accounts: accounts::CreateVoterWeightRecord {
            voter_weight_record,
            registrar,
            payer: *voter,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: instruction::CreateVoterWeightRecord { voter: *voter }.data(),
    }
}

pub fn update_voter_weight_record(
    program_id: &Pubkey,
    mut accounts: accounts::UpdateVoterWeightRecord,
) -> Instruction {
    accounts.insurance_fund_stake = accounts.insurance_fund_stake.or(Some(*program_id));
    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: instruction::UpdateVoterWeightRecord {}.data(),
    }
}
