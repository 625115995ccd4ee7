use crate::types::{AccountId, Coins, Currency};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EconError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient {currency}: need {needed}, have {available}")]
    Insufficient {
        needed: Coins,
        available: Coins,
        currency: Currency,
    },

    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Group '{0}' not found")]
    GroupNotFound(String),

    #[error("Code '{0}' not found")]
    CodeNotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Tool on cooldown: {remaining_secs}s remaining")]
    Cooldown { remaining_secs: i64 },

    #[error("Account {0} is banned")]
    Banned(AccountId),

    #[error("Insufficient privileges for this operation")]
    PermissionDenied,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EconResult<T> = Result<T, EconError>;
