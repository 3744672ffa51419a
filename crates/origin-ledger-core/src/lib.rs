//! # Origin Ledger Core
//!
//! Pure primitives for the Origin Ledger SDK: hierarchical keys, addresses,
//! transactions, batches and the records they write.
//!
//! This crate contains no I/O and no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`ExtendedKey`] - A node of the BIP32 key tree
//! - [`Address`] - A ledger address derived from a public key and an entity prefix
//! - [`Transaction`] - A signed state change, identified by its header signature
//! - [`SignedBatch`] - An atomically committed, signed group of transactions
//!
//! ## Wire Format
//!
//! Envelopes are encoded using deterministic CBOR. See [`canonical`] module.

pub mod address;
pub mod batch;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod records;
pub mod transaction;
pub mod types;
pub mod validation;

pub use address::{address, Address, AddressPrefix};
pub use batch::{BatchHeader, BatchList, SignedBatch};
pub use crypto::{Blake3Hash, Keypair, PublicKey, Signature, Signer};
pub use error::{CoreError, KeyError};
pub use keys::{ChildIndex, ExtendedKey, HARDENED_OFFSET};
pub use records::{
    Direction, Ggo, LedgerRecord, Measurement, ResolvedRecord, Settlement, SettlementPart,
};
pub use transaction::{Transaction, TransactionBuilder, TransactionHeader};
pub use types::{BatchId, TransactionId};
pub use validation::{validate_batch, validate_transaction};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
