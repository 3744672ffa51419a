//! Error types for the ledger client.

use thiserror::Error;

use origin_ledger_core::BatchId;

use crate::messages::InvalidTransaction;

/// Errors that can occur while talking to the ledger.
///
/// Kinds stay distinct so callers can pick a retry policy: transport
/// failures are usually worth retrying, ledger rejections are not.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete at the HTTP layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The ledger answered with an explicit error object.
    #[error("ledger rejected the request ({code}, {title}): {message}")]
    LedgerRejected {
        code: i64,
        message: String,
        title: String,
    },

    /// A request or response body could not be serialized.
    #[error("could not encode body: {0}")]
    Encode(String),

    /// The response body could not be parsed.
    #[error("could not decode ledger response: {0}")]
    ResponseDecode(String),

    /// No state exists at the address.
    #[error("no state at address {0}")]
    NotFound(String),

    /// The batch reached the INVALID status.
    #[error("batch {batch_id:?} is invalid ({} invalid transactions)", .invalid_transactions.len())]
    BatchInvalid {
        batch_id: BatchId,
        invalid_transactions: Vec<InvalidTransaction>,
    },

    /// The poll budget ran out before the batch reached a terminal status.
    #[error("batch not settled after {attempts} status polls")]
    TimedOut { attempts: u32 },

    /// Core encoding or address error.
    #[error("core error: {0}")]
    Core(#[from] origin_ledger_core::CoreError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
