use anchor_lang::{AccountSerialize, AnchorSerialize};
use drift_stake_voter::account::Registrar;
use drift_stake_voter::context::registrar_address;
use drift_stake_voter::drift::{
    insurance_fund_stake_address, insurance_fund_vault_address, spot_market_address,
    DriftAccount, InsuranceFund, InsuranceFundStake, SpotMarket,
};
use drift_stake_voter::governance::{
    get_token_owner_record_address, Realm, RealmConfig, TokenOwnerRecord,
};
use solana_program::program_option::COption;
use solana_program::program_pack::Pack;
use solana_program_test::ProgramTest;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;

pub struct RealmCookie {
    pub address: Pubkey,
    pub community_mint: Pubkey,
    pub council_mint: Pubkey,
}

pub struct SpotMarketCookie {
    pub address: Pubkey,
    pub market_index: u16,
    pub vault: Pubkey,
}

/// Writes Drift, governance and addin accounts straight into the bank
/// before it starts.
pub struct AccountsBuilder {
    pub test: ProgramTest,
    pub drift_program: Pubkey,
    pub governance_program: Pubkey,
}

impl AccountsBuilder {
    pub fn new(test: ProgramTest) -> Self {
        Self {
            test,
            drift_program: Pubkey::new_unique(),
            governance_program: Pubkey::new_unique(),
        }
    }

    fn add(&mut self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.test.add_account(
            address,
            Account {
                lamports: Rent::default().minimum_balance(data.len()),
                data,
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub fn add_mint(&mut self, supply: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        let mint = spl_token::state::Mint {
            mint_authority: COption::None,
            supply,
            decimals: 6,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; spl_token::state::Mint::LEN];
        spl_token::state::Mint::pack(mint, &mut data).unwrap();
        self.add(address, spl_token::id(), data);
        address
    }

    pub fn add_realm(
        &mut self,
        name: &str,
        community_supply: u64,
        council_supply: u64,
    ) -> RealmCookie {
        let address = Pubkey::new_unique();
        let community_mint = self.add_mint(community_supply);
        let council_mint = self.add_mint(council_supply);
        let realm = Realm::new(
            name,
            community_mint,
            RealmConfig {
                council_mint: Some(council_mint),
                ..RealmConfig::default()
            },
        );
        self.add(address, self.governance_program, realm.try_to_vec().unwrap());
        RealmCookie {
            address,
            community_mint,
            council_mint,
        }
    }

    pub fn add_token_owner_record(
        &mut self,
        realm: &RealmCookie,
        mint: Pubkey,
        owner: Pubkey,
        deposit: u64,
        delegate: Option<Pubkey>,
    ) -> Pubkey {
        let address =
            get_token_owner_record_address(&self.governance_program, &realm.address, &mint, &owner);
        let mut record = TokenOwnerRecord::new(realm.address, mint, owner, deposit);
        record.governance_delegate = delegate;
        self.add(address, self.governance_program, record.try_to_vec().unwrap());
        address
    }

    pub fn add_registrar(&mut self, realm: &RealmCookie, market_index: u16) -> Pubkey {
        let (address, _) =
            registrar_address(&drift_stake_voter::ID, &realm.address, &realm.community_mint);
        let registrar = Registrar {
            governance_program_id: self.governance_program,
            realm: realm.address,
            governing_token_mint: realm.community_mint,
            drift_program_id: self.drift_program,
            spot_market_index: market_index,
        };
        let mut data = vec![];
        registrar.try_serialize(&mut data).unwrap();
        self.add(address, drift_stake_voter::ID, data);
        address
    }

    /// A spot market whose insurance fund holds `vault_balance` tokens
    /// against `total_shares`.
    pub fn add_spot_market(
        &mut self,
        market_index: u16,
        mint: Pubkey,
        total_shares: u128,
        vault_balance: u64,
    ) -> SpotMarketCookie {
        let address = spot_market_address(&self.drift_program, market_index);
        let vault = insurance_fund_vault_address(&self.drift_program, market_index);

        let market = SpotMarket::new(
            address,
            mint,
            InsuranceFund::new(vault, total_shares),
        );
        self.add(address, self.drift_program, market.to_account_data());

        let token_account = spl_token::state::Account {
            mint,
            owner: Pubkey::new_unique(),
            amount: vault_balance,
            delegate: COption::None,
            state: spl_token::state::AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(token_account, &mut data).unwrap();
        self.add(vault, spl_token::id(), data);

        SpotMarketCookie {
            address,
            market_index,
            vault,
        }
    }

    pub fn add_stake(&mut self, market: &SpotMarketCookie, stake: InsuranceFundStake) -> Pubkey {
        let address =
            insurance_fund_stake_address(&self.drift_program, &stake.authority, market.market_index);
        self.add(address, self.drift_program, stake.to_account_data());
        address
    }
}
