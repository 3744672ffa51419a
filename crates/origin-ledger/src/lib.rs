//! # Origin Ledger
//!
//! The unified API for issuing and trading energy origin certificates on
//! the ledger.
//!
//! ## Overview
//!
//! - **Keys**: A BIP32 key tree; every measurement and certificate lives at
//!   an address derived from one of its keys
//! - **Requests**: Intents (publish, issue, split, transfer, retire)
//!   compiled into signed transactions
//! - **Batches**: Transactions committed atomically under one signature
//! - **Client**: Submission, status polling and record lookups
//!
//! ## Usage
//!
//! ```rust,no_run
//! use origin_ledger::{BatchBuilder, Direction, ExtendedKey, IssueGgo, Ledger, PublishMeasurement};
//! # use chrono::{TimeZone, Utc};
//!
//! async fn example() -> origin_ledger::Result<()> {
//!     let ledger = Ledger::connect("http://localhost:8008")?;
//!
//!     let master = ExtendedKey::generate();
//!     let meter = master.derive_hardened(0)?.derive(0)?;
//!     # let begin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
//!     # let end = Utc.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap();
//!
//!     let batch = BatchBuilder::new(master.keypair()?)
//!         .with(PublishMeasurement::new(meter.clone(), 100, begin, end, "DK1", Direction::Production))
//!         .with(IssueGgo::new(meter.clone(), "T010101", "F01010101"));
//!
//!     let handle = ledger.execute_batch(&batch).await?;
//!     ledger.wait_for_commit(&handle).await?;
//!
//!     let measurement = ledger.get_measurement(&meter.address(origin_ledger::AddressPrefix::Measurement)).await?;
//!     println!("published {} Wh", measurement.amount);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `origin_ledger::core` - Keys, addresses, transactions and records
//! - `origin_ledger::requests` - Request compiler and batch builder
//! - `origin_ledger::client` - Transport, client and batch tracking

pub mod error;
pub mod ledger;

pub use origin_ledger_client as client;
pub use origin_ledger_core as core;
pub use origin_ledger_requests as requests;

pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig};

pub use origin_ledger_client::{
    BatchStatus, ClientConfig, Handle, HttpTransport, PollPolicy, StatusRecord, Transport,
};
pub use origin_ledger_core::{
    Address, AddressPrefix, Direction, ExtendedKey, Ggo, Keypair, Measurement, PublicKey,
    ResolvedRecord, Settlement, SignedBatch, Signer,
};
pub use origin_ledger_requests::{
    BatchBuilder, IssueGgo, PublishMeasurement, Request, RetireGgo, SplitGgo, SplitPart,
    TransferGgo,
};
