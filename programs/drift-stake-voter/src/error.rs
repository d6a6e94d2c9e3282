use solana_program::pubkey::Pubkey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The account source failed to answer, as opposed to answering "not found".
    #[error("account source error: {0}")]
    Source(String),

    #[error("{kind} not found: {address}")]
    AccountNotFound { kind: &'static str, address: Pubkey },

    #[error("Realm not found: {0}")]
    RealmNotFound(Pubkey),

    #[error("failed to decode {kind} at {address}: {reason}")]
    Decode {
        kind: &'static str,
        address: Pubkey,
        reason: String,
    },

    #[error("{kind} at {address} is owned by {owner}, expected {expected}")]
    InvalidOwner {
        kind: &'static str,
        address: Pubkey,
        owner: Pubkey,
        expected: Pubkey,
    },

    #[error("arithmetic overflow")]
    MathOverflow,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn decode(kind: &'static str, address: Pubkey, reason: impl ToString) -> Self {
        ClientError::Decode {
            kind,
            address,
            reason: reason.to_string(),
        }
    }
}
