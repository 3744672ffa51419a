//! Error types for request compilation.

use thiserror::Error;

/// Errors that can occur while compiling requests into transactions.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A key that has to sign its own transaction carries no private material.
    #[error("missing private key material for the {role} key")]
    MissingKeyMaterial { role: &'static str },

    /// Key derivation failed.
    #[error("key error: {0}")]
    Key(#[from] origin_ledger_core::KeyError),

    /// Encoding or address error from the core.
    #[error("core error: {0}")]
    Core(#[from] origin_ledger_core::CoreError),

    /// A payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encode(String),

    /// A payload could not be decoded.
    #[error("payload error: {0}")]
    Payload(String),

    /// The family name is not one this SDK produces.
    #[error("unknown transaction family: {0}")]
    UnknownFamily(String),
}

/// Result type for request operations.
pub type Result<T> = std::result::Result<T, RequestError>;
