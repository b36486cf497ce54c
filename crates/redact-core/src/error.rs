use thiserror::Error;

use crate::policy::ValidationError;

#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Text length {len} exceeds maximum allowed size {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("Invalid regex pattern '{name}': {source}")]
    InvalidPattern { name: String, source: regex::Error },

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Key version {0} has been retired")]
    KeyRetired(u32),

    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    #[error("Policy validation failed: {} error(s) found", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    #[error("Policy not found for tenant: {0}")]
    PolicyNotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RedactError>;
