use std::sync::Mutex;

use async_trait::async_trait;
use drift_stake_voter::{AccountSource, ClientError, RawAccount, Result};
use solana_program_test::BanksClient;
use solana_sdk::pubkey::Pubkey;

pub struct SolanaCookie {
    banks_client: Mutex<BanksClient>,
}

impl SolanaCookie {
    pub fn new(banks_client: BanksClient) -> Self {
        Self {
            banks_client: Mutex::new(banks_client),
        }
    }

    fn banks_client(&self) -> BanksClient {
        self.banks_client.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountSource for SolanaCookie {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<RawAccount>> {
        let account = self
            .banks_client()
            .get_account(*address)
            .await
            .map_err(|e| ClientError::Source(e.to_string()))?;
        Ok(account.map(|account| RawAccount {
            owner: account.owner,
            data: account.data,
        }))
    }
}
