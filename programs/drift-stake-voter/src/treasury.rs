//! Treasury list entries for token owner records a wallet holds in other
//! realms.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};
use crate::governance::TokenOwnerRecord;

/// One realm of the published realm list (`mainnet-beta.json`).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RealmInfo {
    pub realm_id: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RealmDirectory {
    realms: Vec<RealmInfo>,
}

impl RealmDirectory {
    pub fn new(realms: Vec<RealmInfo>) -> Self {
        Self { realms }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let realms = serde_json::from_str(json)
            .map_err(|e| ClientError::InvalidConfig(format!("realm list: {}", e)))?;
        Ok(Self::new(realms))
    }

    pub fn find(&self, realm: &Pubkey) -> Option<&RealmInfo> {
        let realm = realm.to_string();
        self.realms.iter().find(|info| info.realm_id == realm)
    }
}

/// What is selected in the treasury view. Serialized with a `_kind` tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_kind")]
pub enum TreasurySelection {
    #[serde(rename_all = "camelCase")]
    TokenOwnerRecord {
        selected_governance: String,
        pubkey: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Thumbnail {
    Image(String),
    UserGroupIcon,
}

pub const UNKNOWN_REALM: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenOwnerRecordListItem {
    pub pubkey: Pubkey,
    pub governance: Pubkey,
    pub name: String,
    pub thumbnail: Thumbnail,
    pub selected: bool,
}

impl TokenOwnerRecordListItem {
    /// `None` while the record has not been loaded.
    pub fn new(
        pubkey: Pubkey,
        governance: Pubkey,
        record: Option<&TokenOwnerRecord>,
        directory: &RealmDirectory,
        selection: Option<&TreasurySelection>,
    ) -> Option<Self> {
        let record = record?;
        let info = directory.find(&record.realm);

        let name = info
            .and_then(|info| info.symbol.clone())
            .unwrap_or_else(|| UNKNOWN_REALM.to_string());
        let thumbnail = match info.and_then(|info| info.og_image.clone()) {
            Some(image) => Thumbnail::Image(image),
            None => Thumbnail::UserGroupIcon,
        };
        let selected = matches!(
            selection,
            Some(TreasurySelection::TokenOwnerRecord { pubkey: selected, .. })
                if *selected == pubkey.to_string()
        );

        Some(Self {
            pubkey,
            governance,
            name,
            thumbnail,
            selected,
        })
    }

    /// The selection to store when the item is clicked.
    pub fn on_select(&self) -> TreasurySelection {
        TreasurySelection::TokenOwnerRecord {
            selected_governance: self.governance.to_string(),
            pubkey: self.pubkey.to_string(),
        }
    }
}
