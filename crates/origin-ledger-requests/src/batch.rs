//! Batch assembly and signing.

use origin_ledger_core::{ExtendedKey, Keypair, SignedBatch, Signer};

use crate::error::Result;
use crate::request::{signing_key, Compile, Request};

/// Collects requests and compiles them into one signed batch.
///
/// Requests are compiled lazily in [`BatchBuilder::build`], in the order they
/// were added. If any request fails to compile, no batch is produced.
#[derive(Debug, Clone)]
pub struct BatchBuilder<S = Keypair> {
    signer: S,
    requests: Vec<Request>,
}

impl BatchBuilder<Keypair> {
    /// Create an empty builder signing with the private half of `key`.
    ///
    /// Fails with [`RequestError::MissingKeyMaterial`] for public-only handles.
    ///
    /// [`RequestError::MissingKeyMaterial`]: crate::RequestError::MissingKeyMaterial
    pub fn from_key(key: &ExtendedKey) -> Result<Self> {
        Ok(Self::new(signing_key(key, "batch")?))
    }
}

impl<S: Signer> BatchBuilder<S> {
    /// Create an empty builder signing with `signer`.
    pub fn new(signer: S) -> Self {
        Self {
            signer,
            requests: Vec::new(),
        }
    }

    /// Append a request.
    pub fn add(&mut self, request: impl Into<Request>) -> &mut Self {
        self.requests.push(request.into());
        self
    }

    /// Append a request, builder style.
    pub fn with(mut self, request: impl Into<Request>) -> Self {
        self.add(request);
        self
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Compile every request and sign the resulting batch.
    pub fn build(&self) -> Result<SignedBatch> {
        let batcher = self.signer.public_key();

        let mut transactions = Vec::new();
        for request in &self.requests {
            transactions.extend(request.compile(&batcher)?);
        }

        Ok(SignedBatch::sign(transactions, &self.signer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::request::{IssueGgo, PublishMeasurement, RetireGgo, TransferGgo};
    use chrono::{TimeZone, Utc};
    use origin_ledger_core::{AddressPrefix, Direction, ExtendedKey, Transaction};

    fn master() -> ExtendedKey {
        ExtendedKey::from_entropy(b"batch builder tests").unwrap()
    }

    fn builder() -> BatchBuilder {
        BatchBuilder::new(master().derive_hardened(0).unwrap().keypair().unwrap())
    }

    fn publish(key: &ExtendedKey, amount: u64) -> PublishMeasurement {
        PublishMeasurement::new(
            key.clone(),
            amount,
            Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 6, 1, 1, 0, 0).unwrap(),
            "DK1",
            Direction::Production,
        )
    }

    #[test]
    fn test_empty_batch() {
        let builder = builder();
        assert!(builder.is_empty());

        let batch = builder.build().unwrap();
        assert!(batch.is_empty());
        assert!(batch.transaction_ids().is_empty());
        batch.verify().unwrap();
    }

    #[test]
    fn test_publish_then_issue() {
        let key = master().derive(1).unwrap();
        let mut builder = builder();
        builder
            .add(publish(&key, 100))
            .add(IssueGgo::new(key.clone(), "T010101", "F01010101"));
        assert_eq!(builder.len(), 2);

        let batch = builder.build().unwrap();
        assert_eq!(batch.len(), 2);

        let measurement = key.address(AddressPrefix::Measurement);
        let issue = &batch.transactions[1];
        assert!(issue.inputs().contains(&measurement));
        let ggo = key.address(AddressPrefix::Ggo);
        assert!(issue.outputs().contains(&ggo));
        assert_ne!(ggo, measurement);
        batch.verify().unwrap();
    }

    #[test]
    fn test_ids_are_flattened_in_order() {
        let m = master().derive(2).unwrap();
        let g1 = master().derive(3).unwrap();
        let g2 = master().derive(4).unwrap();

        let builder = builder()
            .with(publish(&m, 10))
            .with(RetireGgo::new(m.clone(), vec![g1.clone(), g2.clone()]))
            .with(TransferGgo::to_key(g1, &g2.public_key()));

        let batch = builder.build().unwrap();
        assert_eq!(batch.len(), 1 + 3 + 1);

        let ids: Vec<_> = batch.transactions.iter().map(Transaction::id).collect();
        assert_eq!(batch.transaction_ids(), ids.as_slice());
        for tx in &batch.transactions {
            assert_eq!(tx.header.batcher_public_key, builder.signer().public_key());
        }
    }

    #[test]
    fn test_rebuild_is_identical() {
        let key = master().derive(5).unwrap();
        let builder = builder().with(publish(&key, 7));
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
    }

    #[test]
    fn test_failing_request_aborts_build() {
        let key = master().derive(6).unwrap();
        let builder = builder()
            .with(publish(&key, 1))
            .with(IssueGgo::new(key.neuter(), "T", "F"));

        assert!(matches!(
            builder.build(),
            Err(RequestError::MissingKeyMaterial { .. })
        ));
    }

    #[test]
    fn test_extended_key_as_batch_signer() {
        let signer = master().derive_hardened(9).unwrap();
        let key = master().derive(7).unwrap();
        let batch = BatchBuilder::from_key(&signer)
            .unwrap()
            .with(publish(&key, 1))
            .build()
            .unwrap();
        assert_eq!(batch.signer(), &signer.public_key());
        batch.verify().unwrap();
    }

    #[test]
    fn test_public_only_batch_key_cannot_sign() {
        let signer = master().neuter();
        let result = BatchBuilder::from_key(&signer);
        assert!(matches!(
            result,
            Err(RequestError::MissingKeyMaterial { role: "batch" })
        ));
    }
}
