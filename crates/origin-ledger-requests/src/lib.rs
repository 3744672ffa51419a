//! # Origin Ledger Requests
//!
//! Compiles high-level intents into signed, ledger-ready batches.
//!
//! ## Overview
//!
//! Each [`Request`] variant knows which addresses it reads and writes and
//! which key authorizes it. The [`BatchBuilder`] collects requests, compiles
//! them in insertion order and signs the batch header over the resulting
//! transaction ids.
//!
//! ## Requests
//!
//! - **PublishMeasurement**: Writes a metered amount for a time window
//! - **IssueGgo**: Issues a certificate against a production measurement
//! - **SplitGgo**: Splits a certificate into parts at new addresses
//! - **TransferGgo**: Moves a certificate to a new address
//! - **RetireGgo**: Consumes certificates against a consumption measurement
//!
//! ## Usage
//!
//! ```rust,no_run
//! use origin_ledger_core::{Direction, ExtendedKey};
//! use origin_ledger_requests::{BatchBuilder, IssueGgo, PublishMeasurement};
//! # use chrono::{TimeZone, Utc};
//!
//! let master = ExtendedKey::from_entropy(b"example seed").unwrap();
//! let meter = master.derive(0).unwrap();
//! let begin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap();
//!
//! let batch = BatchBuilder::new(master.keypair().unwrap())
//!     .with(PublishMeasurement::new(meter.clone(), 100, begin, end, "DK1", Direction::Production))
//!     .with(IssueGgo::new(meter, "T010101", "F01010101"))
//!     .build()
//!     .unwrap();
//! ```

pub mod batch;
pub mod error;
pub mod payload;
pub mod request;

pub use batch::BatchBuilder;
pub use error::{RequestError, Result};
pub use payload::{
    Family, IssueGgoPayload, LedgerPayload, Payload, PublishMeasurementPayload, RetireGgoPayload,
    SettlementPayload, SplitGgoPart, SplitGgoPayload, TransferGgoPayload, FAMILY_VERSION,
};
pub use request::{
    Compile, IssueGgo, PublishMeasurement, Request, RetireGgo, RetirePart, SplitGgo, SplitPart,
    TransferGgo,
};
