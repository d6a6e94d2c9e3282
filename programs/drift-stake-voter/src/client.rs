use anchor_spl::token::{self, TokenAccount};
use async_trait::async_trait;
use log::debug;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::account::{Registrar, VoterWeightRecord};
use crate::config::ClientConfig;
use crate::context::{self, accounts};
use crate::drift::{
    insurance_fund_stake_address, insurance_fund_vault_address, spot_market_address,
    DriftAccount, InsuranceFundStake, SpotMarket,
};
use crate::error::{ClientError, Result};
use crate::fetch::{fetch_anchor, fetch_with, AccountSource, Fetched};
use crate::governance::{fetch_realm, get_token_owner_record_address};
use crate::plugin::{UpdateVoterWeightInstructions, VoterWeightPlugin};

/// Addresses involved in valuing one voter's stake.
#[derive(Clone, Debug)]
struct StakeAccounts {
    registrar: Pubkey,
    drift_program: Pubkey,
    spot_market: Pubkey,
    insurance_fund_vault: Pubkey,
    insurance_fund_stake: Pubkey,
}

/// Fetches a Drift zero-copy account, which must be owned by the Drift program.
async fn load_drift_account<T, S>(
    source: &S,
    address: &Pubkey,
    drift_program: &Pubkey,
) -> Result<Fetched<T>>
where
    T: DriftAccount,
    S: AccountSource + ?Sized,
{
    fetch_with(source, address, |account| {
        account.check_owner(T::NAME, address, drift_program)?;
        T::load(address, &account.data)
    })
    .await
}

/// Client of the Drift stake voter addin.
#[derive(Clone, Debug)]
pub struct DriftVoterClient<S> {
    source: S,
    program_id: Pubkey,
    devnet: bool,
}

impl<S: AccountSource> DriftVoterClient<S> {
    /// Uses the mainnet addin unless `program_id` says otherwise.
    pub fn connect(source: S, program_id: Option<Pubkey>, devnet: bool) -> Self {
        Self {
            source,
            program_id: program_id.unwrap_or(crate::ID),
            devnet,
        }
    }

    pub fn from_config(source: S, config: &ClientConfig) -> Result<Self> {
        Ok(Self::connect(source, Some(config.program_id()?), config.devnet))
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn devnet(&self) -> bool {
        self.devnet
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registrar_address(&self, realm: &Pubkey, mint: &Pubkey) -> Pubkey {
        context::registrar_address(&self.program_id, realm, mint).0
    }

    pub fn voter_weight_record_address(
        &self,
        realm: &Pubkey,
        mint: &Pubkey,
        voter: &Pubkey,
    ) -> Pubkey {
        context::voter_weight_record_address(&self.program_id, realm, mint, voter).0
    }

    pub async fn registrar(&self, realm: &Pubkey, mint: &Pubkey) -> Result<Registrar> {
        let address = self.registrar_address(realm, mint);
        fetch_anchor::<Registrar, _>(&self.source, "Registrar", &address, &self.program_id)
            .await?
            .require("Registrar", address)
    }

    /// The record as last written by the addin.
    pub async fn voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Fetched<VoterWeightRecord>> {
        let address = self.voter_weight_record_address(realm, mint, voter);
        fetch_anchor(&self.source, "VoterWeightRecord", &address, &self.program_id).await
    }

    async fn stake_accounts(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<StakeAccounts> {
        let registrar = self.registrar(realm, mint).await?;

        let drift_program = registrar.drift_program_id;
        let market_index = registrar.spot_market_index;
        Ok(StakeAccounts {
            registrar: self.registrar_address(realm, mint),
            drift_program,
            spot_market: spot_market_address(&drift_program, market_index),
            insurance_fund_vault: insurance_fund_vault_address(&drift_program, market_index),
            insurance_fund_stake: insurance_fund_stake_address(
                &drift_program,
                voter,
                market_index,
            ),
        })
    }

    async fn insurance_fund_stake(
        &self,
        addresses: &StakeAccounts,
    ) -> Result<Fetched<InsuranceFundStake>> {
        load_drift_account(
            &self.source,
            &addresses.insurance_fund_stake,
            &addresses.drift_program,
        )
        .await
    }

    /// `input_voter_weight` plus the token value of the voter's insurance
    /// fund stake. A voter without a stake account keeps the input weight.
    pub async fn calculate_voter_weight(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
        input_voter_weight: u64,
    ) -> Result<u64> {
        let addresses = self.stake_accounts(voter, realm, mint).await?;

        let (spot_market, stake) = futures::try_join!(
            load_drift_account::<SpotMarket, _>(
                &self.source,
                &addresses.spot_market,
                &addresses.drift_program,
            ),
            self.insurance_fund_stake(&addresses),
        )?;
        let spot_market = spot_market.require("SpotMarket", addresses.spot_market)?;

        let Some(stake) = stake.found() else {
            debug!(
                "no insurance fund stake account found for {} at {}",
                voter, addresses.insurance_fund_stake
            );
            return Ok(input_voter_weight);
        };

        let vault = fetch_anchor::<TokenAccount, _>(
            &self.source,
            "Insurance fund vault",
            &addresses.insurance_fund_vault,
            &token::ID,
        )
        .await?
        .require("Insurance fund vault", addresses.insurance_fund_vault)?;

        let amount = stake.amount(&spot_market.insurance_fund, vault.amount)?;
        debug!("insurance fund stake of {} is worth {}", voter, amount);

        u64::try_from(amount)
            .ok()
            .and_then(|amount| input_voter_weight.checked_add(amount))
            .ok_or(ClientError::MathOverflow)
    }

    /// Builds the addin instruction writing the voter's current weight. The
    /// stake account is passed as absent when the voter never staked.
    pub async fn update_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<UpdateVoterWeightInstructions> {
        let realm_account = fetch_realm(&self.source, realm)
            .await?
            .found()
            .ok_or(ClientError::RealmNotFound(*realm))?;
        let token_owner_record =
            get_token_owner_record_address(&realm_account.owner, realm, mint, voter);

        let addresses = self.stake_accounts(voter, realm, mint).await?;
        let stake = self.insurance_fund_stake(&addresses).await?;
        if !stake.is_found() {
            debug!(
                "no insurance fund stake account found for {} at {}",
                voter, addresses.insurance_fund_stake
            );
        }

        let ix = context::update_voter_weight_record(
            &self.program_id,
            accounts::UpdateVoterWeightRecord {
                voter_weight_record: self.voter_weight_record_address(realm, mint, voter),
                registrar: addresses.registrar,
                drift_program: addresses.drift_program,
                spot_market: addresses.spot_market,
                insurance_fund_stake: stake.is_found().then_some(addresses.insurance_fund_stake),
                insurance_fund_vault: addresses.insurance_fund_vault,
                token_owner_record,
            },
        );

        Ok(UpdateVoterWeightInstructions {
            pre: vec![ix],
            post: vec![],
        })
    }

    /// The voter pays for their own record.
    pub fn create_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Instruction {
        context::create_voter_weight_record(&self.program_id, realm, mint, voter)
    }
}

#[async_trait]
impl<S: AccountSource> VoterWeightPlugin for DriftVoterClient<S> {
    fn name(&self) -> &str {
        "drift"
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn requires_input_voter_weight(&self) -> bool {
        true
    }

    async fn calculate_voter_weight(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
        input_voter_weight: u64,
    ) -> Result<u64> {
        DriftVoterClient::calculate_voter_weight(self, voter, realm, mint, input_voter_weight).await
    }

    async fn update_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<UpdateVoterWeightInstructions> {
        DriftVoterClient::update_voter_weight_record(self, voter, realm, mint).await
    }

    async fn create_voter_weight_record(
        &self,
        voter: &Pubkey,
        realm: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<Instruction>> {
        Ok(Some(DriftVoterClient::create_voter_weight_record(
            self, voter, realm, mint,
        )))
    }
}

#[cfg(test)]
mod tests {
    use anchor_lang::{AccountSerialize, AnchorSerialize};
    use solana_program::program_option::COption;
    use solana_program::program_pack::Pack;

    use super::*;
    use crate::drift::InsuranceFund;
    use crate::fetch::memory::MemorySource;
    use crate::governance::{Realm, RealmConfig};

    const MARKET_INDEX: u16 = 15;

    struct Fixture {
        source: MemorySource,
        drift_program: Pubkey,
        governance_program: Pubkey,
        realm: Pubkey,
        mint: Pubkey,
        voter: Pubkey,
    }

    impl Fixture {
        fn new() -> Self {
            let mut f = Fixture {
                source: MemorySource::default(),
                drift_program: Pubkey::new_unique(),
                governance_program: Pubkey::new_unique(),
                realm: Pubkey::new_unique(),
                mint: Pubkey::new_unique(),
                voter: Pubkey::new_unique(),
            };

            let registrar = Registrar {
                governance_program_id: f.governance_program,
                realm: f.realm,
                governing_token_mint: f.mint,
                drift_program_id: f.drift_program,
                spot_market_index: MARKET_INDEX,
            };
            let mut data = vec![];
            registrar.try_serialize(&mut data).unwrap();
            let (address, _) = context::registrar_address(&crate::ID, &f.realm, &f.mint);
            f.source.insert(address, crate::ID, data);

            let realm = Realm::new("drift", f.mint, RealmConfig::default());
            f.source
                .insert(f.realm, f.governance_program, realm.try_to_vec().unwrap());

            // 1_000 total shares over a vault of 10_000 tokens.
            let vault = insurance_fund_vault_address(&f.drift_program, MARKET_INDEX);
            let market = SpotMarket::new(
                spot_market_address(&f.drift_program, MARKET_INDEX),
                f.mint,
                InsuranceFund::new(vault, 1_000),
            );
            f.source.insert(
                market.pubkey,
                f.drift_program,
                market.to_account_data(),
            );
            f
        }

        fn stake(&mut self, stake: InsuranceFundStake) {
            let address = insurance_fund_stake_address(&self.drift_program, &self.voter, MARKET_INDEX);
            self.source
                .insert(address, self.drift_program, stake.to_account_data());
        }

        fn vault(&mut self, amount: u64) {
            let account = spl_token::state::Account {
                mint: self.mint,
                owner: Pubkey::new_unique(),
                amount,
                delegate: COption::None,
                state: spl_token::state::AccountState::Initialized,
                is_native: COption::None,
                delegated_amount: 0,
                close_authority: COption::None,
            };
            let mut data = vec![0u8; spl_token::state::Account::LEN];
            spl_token::state::Account::pack(account, &mut data).unwrap();
            let address = insurance_fund_vault_address(&self.drift_program, MARKET_INDEX);
            self.source.insert(address, spl_token::ID, data);
        }

        fn client(self) -> (DriftVoterClient<MemorySource>, Pubkey, Pubkey, Pubkey) {
            let (voter, realm, mint) = (self.voter, self.realm, self.mint);
            (DriftVoterClient::connect(self.source, None, false), voter, realm, mint)
        }
    }

    #[tokio::test]
    async fn adds_stake_value() {
        let mut f = Fixture::new();
        f.stake(
            InsuranceFundStake::new(f.voter, MARKET_INDEX)
                .with_shares(1_000)
                .with_withdraw_request(200, 500, 0),
        );
        f.vault(10_000);
        let (client, voter, realm, mint) = f.client();

        // (1_000 - 200) * 10_000 / 1_000 + 500
        let weight = client
            .calculate_voter_weight(&voter, &realm, &mint, 100)
            .await
            .unwrap();
        assert_eq!(weight, 8_600);
    }

    #[tokio::test]
    async fn no_stake_keeps_input() {
        let f = Fixture::new();
        let (client, voter, realm, mint) = f.client();
        let weight = client
            .calculate_voter_weight(&voter, &realm, &mint, 42)
            .await
            .unwrap();
        assert_eq!(weight, 42);
    }

    #[tokio::test]
    async fn missing_accounts() {
        let mut f = Fixture::new();
        f.stake(InsuranceFundStake::new(f.voter, MARKET_INDEX).with_shares(10));
        let (client, voter, realm, mint) = f.client();

        let err = client
            .calculate_voter_weight(&voter, &realm, &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::AccountNotFound {
                kind: "Insurance fund vault",
                ..
            }
        ));

        let err = client
            .calculate_voter_weight(&voter, &Pubkey::new_unique(), &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::AccountNotFound {
                kind: "Registrar",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn corrupt_stake_is_an_error() {
        let mut f = Fixture::new();
        let address = insurance_fund_stake_address(&f.drift_program, &f.voter, MARKET_INDEX);
        f.source.insert(address, f.drift_program, vec![0u8; 136]);
        let (client, voter, realm, mint) = f.client();

        let err = client
            .calculate_voter_weight(&voter, &realm, &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode {
                kind: "InsuranceFundStake",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn update_instruction_accounts() {
        let mut f = Fixture::new();
        let stake = insurance_fund_stake_address(&f.drift_program, &f.voter, MARKET_INDEX);
        let token_owner_record =
            get_token_owner_record_address(&f.governance_program, &f.realm, &f.mint, &f.voter);
        f.stake(InsuranceFundStake::new(f.voter, MARKET_INDEX).with_shares(1));
        let (client, voter, realm, mint) = f.client();

        let ixs = client
            .update_voter_weight_record(&voter, &realm, &mint)
            .await
            .unwrap();
        assert_eq!(ixs.pre.len(), 1);
        assert!(ixs.post.is_empty());

        let ix = &ixs.pre[0];
        assert_eq!(ix.program_id, crate::ID);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
        assert_eq!(
            keys[0],
            client.voter_weight_record_address(&realm, &mint, &voter)
        );
        assert_eq!(keys[1], client.registrar_address(&realm, &mint));
        assert_eq!(keys[4], stake);
        assert_eq!(keys[6], token_owner_record);
        assert!(ix.accounts[0].is_writable);
    }

    #[tokio::test]
    async fn update_without_stake() {
        let program_id = Pubkey::new_unique();
        let mut f = Fixture::new();
        // Registrar under the custom program.
        let registrar = f
            .source
            .accounts
            .get(&context::registrar_address(&crate::ID, &f.realm, &f.mint).0)
            .cloned()
            .unwrap();
        let (address, _) = context::registrar_address(&program_id, &f.realm, &f.mint);
        f.source.insert(address, program_id, registrar.data);
        let (voter, realm, mint) = (f.voter, f.realm, f.mint);
        let client = DriftVoterClient::connect(f.source, Some(program_id), true);

        let ixs = client
            .update_voter_weight_record(&voter, &realm, &mint)
            .await
            .unwrap();
        assert_eq!(ixs.pre[0].program_id, program_id);
        assert_eq!(ixs.pre[0].accounts[4].pubkey, program_id);
    }

    #[tokio::test]
    async fn rejects_foreign_owners() {
        let mut f = Fixture::new();
        f.stake(InsuranceFundStake::new(f.voter, MARKET_INDEX).with_shares(10));
        f.vault(10_000);
        let market = spot_market_address(&f.drift_program, MARKET_INDEX);
        let mut account = f.source.accounts.get(&market).cloned().unwrap();
        account.owner = Pubkey::new_unique();
        f.source.accounts.insert(market, account);
        let (client, voter, realm, mint) = f.client();

        let err = client
            .calculate_voter_weight(&voter, &realm, &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidOwner {
                kind: "SpotMarket",
                ..
            }
        ));

        let mut f = Fixture::new();
        f.stake(InsuranceFundStake::new(f.voter, MARKET_INDEX).with_shares(10));
        f.vault(10_000);
        let vault = insurance_fund_vault_address(&f.drift_program, MARKET_INDEX);
        let mut account = f.source.accounts.get(&vault).cloned().unwrap();
        account.owner = f.drift_program;
        f.source.accounts.insert(vault, account);
        let (client, voter, realm, mint) = f.client();

        let err = client
            .calculate_voter_weight(&voter, &realm, &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidOwner {
                kind: "Insurance fund vault",
                ..
            }
        ));

        // Registrar data at the custom addin's address, written by another program.
        let mut f = Fixture::new();
        let program_id = Pubkey::new_unique();
        let registrar = f
            .source
            .accounts
            .get(&context::registrar_address(&crate::ID, &f.realm, &f.mint).0)
            .cloned()
            .unwrap();
        let (address, _) = context::registrar_address(&program_id, &f.realm, &f.mint);
        f.source.accounts.insert(address, registrar);
        let (voter, realm, mint) = (f.voter, f.realm, f.mint);
        let client = DriftVoterClient::connect(f.source, Some(program_id), false);
        let err = client
            .calculate_voter_weight(&voter, &realm, &mint, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidOwner {
                kind: "Registrar",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn reads_voter_weight_record() {
        let mut f = Fixture::new();
        let record = VoterWeightRecord {
            realm: f.realm,
            governing_token_mint: f.mint,
            governing_token_owner: f.voter,
            voter_weight: 8_500,
            voter_weight_expiry: Some(42),
            ..VoterWeightRecord::default()
        };
        let mut data = vec![];
        record.try_serialize(&mut data).unwrap();
        let (address, _) =
            context::voter_weight_record_address(&crate::ID, &f.realm, &f.mint, &f.voter);
        f.source.insert(address, crate::ID, data);
        let (client, voter, realm, mint) = f.client();

        assert_eq!(
            client.voter_weight_record(&voter, &realm, &mint).await.unwrap(),
            Fetched::Found(record)
        );
        assert_eq!(
            client
                .voter_weight_record(&Pubkey::new_unique(), &realm, &mint)
                .await
                .unwrap(),
            Fetched::NotFound
        );
    }

    #[tokio::test]
    async fn update_requires_realm() {
        let f = Fixture::new();
        let (client, voter, _, mint) = f.client();
        let realm = Pubkey::new_unique();
        let err = client
            .update_voter_weight_record(&voter, &realm, &mint)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RealmNotFound(r) if r == realm));
    }

    #[tokio::test]
    async fn as_plugin() {
        let mut f = Fixture::new();
        f.stake(InsuranceFundStake::new(f.voter, MARKET_INDEX).with_shares(100));
        f.vault(10_000);
        let (client, voter, realm, mint) = f.client();
        let plugin: &dyn VoterWeightPlugin = &client;

        assert_eq!(plugin.name(), "drift");
        assert!(plugin.requires_input_voter_weight());
        assert!(!plugin.capabilities().max_voter_weight);
        assert!(plugin.max_voter_weight().is_none());
        assert_eq!(
            plugin
                .calculate_voter_weight(&voter, &realm, &mint, 0)
                .await
                .unwrap(),
            1_000
        );
        let create = plugin
            .create_voter_weight_record(&voter, &realm, &mint)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(create.program_id, crate::ID);
    }

    #[test]
    fn from_config() {
        let program_id = Pubkey::new_unique();
        let config = ClientConfig::from_json(&format!(
            r#"{{"programId": "{}", "devnet": true}}"#,
            program_id
        ))
        .unwrap();
        let client = DriftVoterClient::from_config(MemorySource::default(), &config).unwrap();
        assert_eq!(client.program_id(), program_id);
        assert!(client.devnet());
    }
}
