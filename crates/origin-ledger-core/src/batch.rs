//! Batches: the atomic commit unit.
//!
//! A batch header names the batch signer and the ordered ids of the
//! transactions it carries. Either all of them commit or none do.

use crate::canonical::{batch_header_bytes, batch_list_bytes, decode_batch_list};
use crate::crypto::{PublicKey, Signature, Signer};
use crate::error::CoreError;
use crate::transaction::Transaction;
use crate::types::{BatchId, TransactionId};
use crate::validation::validate_batch;

/// Current batch header version.
pub const BATCH_VERSION: u8 = 1;

/// The signed part of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub version: u8,
    pub signer_public_key: PublicKey,
    /// Ids of the carried transactions, in execution order.
    pub transaction_ids: Vec<TransactionId>,
}

/// A signed batch of transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBatch {
    pub header: BatchHeader,
    pub header_signature: Signature,
    pub transactions: Vec<Transaction>,
}

impl SignedBatch {
    /// Compute the header over `transactions` and sign it.
    pub fn sign<S: Signer + ?Sized>(transactions: Vec<Transaction>, signer: &S) -> Self {
        let header = BatchHeader {
            version: BATCH_VERSION,
            signer_public_key: signer.public_key(),
            transaction_ids: transactions.iter().map(Transaction::id).collect(),
        };
        let header_signature = signer.sign(&batch_header_bytes(&header));

        Self {
            header,
            header_signature,
            transactions,
        }
    }

    /// The batch id (its header signature).
    pub fn id(&self) -> BatchId {
        BatchId::from(self.header_signature)
    }

    pub fn signer(&self) -> &PublicKey {
        &self.header.signer_public_key
    }

    pub fn transaction_ids(&self) -> &[TransactionId] {
        &self.header.transaction_ids
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Check the batch signature and every carried transaction.
    pub fn verify(&self) -> Result<(), CoreError> {
        validate_batch(self)
    }
}

/// The submission envelope: one or more batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchList {
    pub batches: Vec<SignedBatch>,
}

impl BatchList {
    pub fn new(batches: Vec<SignedBatch>) -> Self {
        Self { batches }
    }

    /// Encode to canonical wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        batch_list_bytes(self)
    }

    /// Decode from canonical wire bytes. Does not verify signatures.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_batch_list(bytes)
    }

    pub fn ids(&self) -> Vec<BatchId> {
        self.batches.iter().map(SignedBatch::id).collect()
    }
}

impl From<SignedBatch> for BatchList {
    fn from(batch: SignedBatch) -> Self {
        Self {
            batches: vec![batch],
        }
    }
}
