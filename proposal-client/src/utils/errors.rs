//! Custom error types for the proposal client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("Remote call failed: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    #[error("Invalid bus name: {0}")]
    Name(#[from] zbus::names::Error),

    #[error("Variant error: {0}")]
    Variant(#[from] zvariant::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unsupported bus signature: {0}")]
    UnsupportedSignature(String),
}

pub type Result<T> = std::result::Result<T, ProposalError>;
