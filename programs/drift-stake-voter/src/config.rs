use std::str::FromStr;

use serde::Deserialize;
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};

/// Client settings, as found in a realm's plugin configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base58 address of the addin. Defaults to the mainnet deployment.
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub devnet: bool,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClientError::InvalidConfig(e.to_string()))
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        match &self.program_id {
            Some(program_id) => Pubkey::from_str(program_id)
                .map_err(|e| ClientError::InvalidConfig(format!("programId {}: {}", program_id, e))),
            None => Ok(crate::ID),
        }
    }
}
