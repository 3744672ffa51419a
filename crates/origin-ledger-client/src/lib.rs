//! # Origin Ledger Client
//!
//! Submits signed batches to the ledger, polls their commit status and
//! reads records back from state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use origin_ledger_client::{ClientConfig, HttpTransport, LedgerClient, PollPolicy};
//!
//! async fn example() -> origin_ledger_client::Result<()> {
//!     let config = ClientConfig::new("http://localhost:8008");
//!     let client = LedgerClient::new(HttpTransport::new(&config)?, config);
//!
//!     // let handle = client.submit(&batch).await?;
//!     // let status = client.wait_for_commit(&handle, PollPolicy::default()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Lifecycle
//!
//! ```text
//! Submitted --poll--> Pending --poll--> Committed
//!                        |   \--------> Invalid
//!                        \--budget----> TimedOut
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod tracker;
pub mod transport;

pub use client::LedgerClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use messages::{
    BatchStatus, ErrorBody, Handle, InvalidTransaction, StateResponse, StatusPage, StatusRecord,
    SubmitResponse,
};
pub use tracker::{BatchState, BatchTracker, PollPolicy};
pub use transport::{
    http::HttpTransport, scripted::ScriptedTransport, RawResponse, Transport, OCTET_STREAM,
};
