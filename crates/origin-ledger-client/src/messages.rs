//! JSON bodies exchanged with the ledger REST endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

use origin_ledger_core::{BatchId, TransactionId};

/// Tracking reference returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    /// Status resource to poll.
    pub link: String,
    /// Ids of the submitted batches, in submission order.
    #[serde(default)]
    pub batch_ids: Vec<BatchId>,
}

impl Handle {
    pub fn new(link: impl Into<String>, batch_ids: Vec<BatchId>) -> Self {
        Self {
            link: link.into(),
            batch_ids,
        }
    }
}

/// Response to a batch submission: either a link or an error object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error object returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub title: String,
}

/// Commit status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Unknown,
    Pending,
    Committed,
    Invalid,
}

impl BatchStatus {
    /// Whether the status can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Invalid)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN",
            Self::Pending => "PENDING",
            Self::Committed => "COMMITTED",
            Self::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

/// A transaction the ledger refused, with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidTransaction {
    pub id: TransactionId,
    #[serde(default)]
    pub message: String,
}

/// Status of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: BatchId,
    pub status: BatchStatus,
    #[serde(default)]
    pub invalid_transactions: Vec<InvalidTransaction>,
}

impl StatusRecord {
    /// A record for a batch the ledger has not reported on.
    pub fn unknown(id: BatchId) -> Self {
        Self {
            id,
            status: BatchStatus::Unknown,
            invalid_transactions: Vec::new(),
        }
    }
}

/// A page of batch statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPage {
    #[serde(default)]
    pub data: Vec<StatusRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// State stored at one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    /// Base64 encoded record bytes.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}
