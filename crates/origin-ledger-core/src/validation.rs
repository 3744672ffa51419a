//! Envelope validation: signature verification and structural checks.

use crate::batch::{SignedBatch, BATCH_VERSION};
use crate::canonical::{batch_header_bytes, transaction_header_bytes};
use crate::crypto::Blake3Hash;
use crate::error::CoreError;
use crate::transaction::{Transaction, TRANSACTION_VERSION};

/// Validate a single transaction.
///
/// This performs:
/// - Version check
/// - Payload hash verification
/// - Header signature verification
pub fn validate_transaction(tx: &Transaction) -> Result<(), CoreError> {
    if tx.header.version != TRANSACTION_VERSION {
        return Err(CoreError::UnsupportedVersion(tx.header.version));
    }

    let computed = Blake3Hash::hash(&tx.payload);
    if computed != tx.header.payload_hash {
        return Err(CoreError::PayloadHashMismatch {
            expected: tx.header.payload_hash.to_hex(),
            actual: computed.to_hex(),
        });
    }

    tx.header
        .signer_public_key
        .verify(&transaction_header_bytes(&tx.header), &tx.header_signature)
}

/// Validate a batch and everything it carries.
///
/// This performs:
/// - Version check
/// - Header ids match the carried transactions, in order
/// - Every transaction names the batch signer as its batcher
/// - Batch signature verification
/// - [`validate_transaction`] on each transaction
pub fn validate_batch(batch: &SignedBatch) -> Result<(), CoreError> {
    if batch.header.version != BATCH_VERSION {
        return Err(CoreError::UnsupportedVersion(batch.header.version));
    }

    let ids_match = batch.header.transaction_ids.len() == batch.transactions.len()
        && batch
            .header
            .transaction_ids
            .iter()
            .zip(&batch.transactions)
            .all(|(id, tx)| *id == tx.id());
    if !ids_match {
        return Err(CoreError::MalformedBatch(
            "header ids do not match transactions".into(),
        ));
    }

    if let Some(position) = batch
        .transactions
        .iter()
        .position(|tx| tx.header.batcher_public_key != batch.header.signer_public_key)
    {
        return Err(CoreError::MalformedBatch(format!(
            "transaction {} names a different batcher",
            position
        )));
    }

    batch
        .header
        .signer_public_key
        .verify(&batch_header_bytes(&batch.header), &batch.header_signature)?;

    batch.transactions.iter().try_for_each(validate_transaction)
}
