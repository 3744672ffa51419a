//! # Origin Ledger Testkit
//!
//! Testing utilities for the Origin Ledger SDK.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: BIP32 test vector 1 and known SDK signatures
//! - **Generators**: Proptest strategies for keys, amounts and requests
//! - **Fixtures**: Deterministic parties with a fixed key layout
//! - **MemoryLedger**: An in-process ledger behind the [`Transport`] seam
//!
//! ## Golden Vectors
//!
//! ```rust
//! use origin_ledger_testkit::vectors::verify_bip32_vectors;
//!
//! for (name, matches) in verify_bip32_vectors() {
//!     assert!(matches, "{} differs", name);
//! }
//! ```
//!
//! ## End to End
//!
//! ```rust,no_run
//! use origin_ledger::Direction;
//! use origin_ledger_testkit::fixtures::{memory_ledger, TestParty};
//!
//! async fn example() -> origin_ledger::Result<()> {
//!     let (memory, ledger) = memory_ledger();
//!     let party = TestParty::new(b"example");
//!
//!     let batch = party
//!         .batch()
//!         .with(party.publish(0, 100, Direction::Production))
//!         .with(party.issue(0));
//!     ledger.execute_and_wait(&batch).await?;
//!
//!     assert!(memory.ggo(&party.issued_ggo_address(0)).is_some());
//!     Ok(())
//! }
//! ```
//!
//! [`Transport`]: origin_ledger_client::Transport

pub mod fixtures;
pub mod generators;
pub mod ledger;
pub mod vectors;

pub use fixtures::{memory_ledger, parties, TestParty};
pub use generators::{publish_from_params, MeasurementParams};
pub use ledger::{ExecutionError, MemoryLedger};
pub use vectors::{bip32_vectors, verify_bip32_vectors, Bip32Vector, SignatureVector};
