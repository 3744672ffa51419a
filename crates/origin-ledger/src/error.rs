//! Error types for the ledger facade.

use origin_ledger_client::ClientError;
use origin_ledger_core::{CoreError, KeyError};
use origin_ledger_requests::RequestError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Encoding, signature or address error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Key derivation error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// A request failed to compile.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Submission, polling or state lookup failed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}

impl LedgerError {
    /// Whether the ledger judged the batch invalid.
    pub fn is_batch_invalid(&self) -> bool {
        matches!(self, Self::Client(ClientError::BatchInvalid { .. }))
    }

    /// Whether the failure happened below the HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Client(ClientError::Transport(_)))
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
