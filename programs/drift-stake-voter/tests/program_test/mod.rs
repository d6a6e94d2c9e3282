use std::sync::Arc;

use solana_program_test::*;
use solana_sdk::pubkey::Pubkey;

pub use accounts::*;
pub use solana::*;

pub mod accounts;
pub mod solana;

pub struct TestContext {
    pub solana: Arc<SolanaCookie>,
    pub drift_program: Pubkey,
    pub governance_program: Pubkey,
}

impl TestContext {
    /// Starts a bank holding every account added to `builder`.
    pub async fn start(builder: AccountsBuilder) -> Self {
        solana_logger::setup_with_default(
            "solana_rbpf::vm=info,\
             solana_runtime::message_processor=debug,\
             solana_runtime::system_instruction_processor=info,\
             solana_program_test=info,\
             drift_stake_voter=debug",
        );

        let AccountsBuilder {
            test,
            drift_program,
            governance_program,
        } = builder;
        let (banks_client, _payer, _recent_blockhash) = test.start().await;

        TestContext {
            solana: Arc::new(SolanaCookie::new(banks_client)),
            drift_program,
            governance_program,
        }
    }
}

pub fn new_builder() -> AccountsBuilder {
    AccountsBuilder::new(ProgramTest::default())
}
