//! Transactions: the signed unit a ledger validator executes.
//!
//! A transaction commits to its payload through a Blake3 hash in the header,
//! and the signer signs the canonical header bytes. The header signature
//! doubles as the transaction id.

use bytes::Bytes;

use crate::address::Address;
use crate::canonical::transaction_header_bytes;
use crate::crypto::{Blake3Hash, PublicKey, Signature, Signer};
use crate::error::CoreError;
use crate::types::TransactionId;
use crate::validation::validate_transaction;

/// Current transaction header version.
pub const TRANSACTION_VERSION: u8 = 1;

/// The signed part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    /// Header format version.
    pub version: u8,
    /// Transaction family, selecting the handler that executes the payload.
    pub family_name: String,
    pub family_version: String,
    /// Key authorizing the state change.
    pub signer_public_key: PublicKey,
    /// Key that signs the enclosing batch.
    pub batcher_public_key: PublicKey,
    /// Addresses the handler may read.
    pub inputs: Vec<Address>,
    /// Addresses the handler may write.
    pub outputs: Vec<Address>,
    pub payload_hash: Blake3Hash,
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub header_signature: Signature,
    pub payload: Bytes,
}

impl Transaction {
    /// The transaction id (its header signature).
    pub fn id(&self) -> TransactionId {
        TransactionId::from(self.header_signature)
    }

    /// The canonical bytes the signer signed.
    pub fn header_bytes(&self) -> Vec<u8> {
        transaction_header_bytes(&self.header)
    }

    pub fn family_name(&self) -> &str {
        &self.header.family_name
    }

    pub fn signer(&self) -> &PublicKey {
        &self.header.signer_public_key
    }

    pub fn inputs(&self) -> &[Address] {
        &self.header.inputs
    }

    pub fn outputs(&self) -> &[Address] {
        &self.header.outputs
    }

    /// Check the payload hash and the header signature.
    pub fn verify(&self) -> Result<(), CoreError> {
        validate_transaction(self)
    }
}

/// Builder for constructing signed transactions.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    family_name: String,
    family_version: String,
    inputs: Vec<Address>,
    outputs: Vec<Address>,
    payload: Bytes,
}

impl TransactionBuilder {
    /// Start a transaction for the given family.
    pub fn new(family_name: impl Into<String>, family_version: impl Into<String>) -> Self {
        Self {
            family_name: family_name.into(),
            family_version: family_version.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            payload: Bytes::new(),
        }
    }

    pub fn input(mut self, address: Address) -> Self {
        self.inputs.push(address);
        self
    }

    pub fn inputs(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.inputs.extend(addresses);
        self
    }

    pub fn output(mut self, address: Address) -> Self {
        self.outputs.push(address);
        self
    }

    pub fn outputs(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.outputs.extend(addresses);
        self
    }

    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Build the header and sign it.
    pub fn sign<S: Signer + ?Sized>(self, batcher_public_key: PublicKey, signer: &S) -> Transaction {
        let header = TransactionHeader {
            version: TRANSACTION_VERSION,
            family_name: self.family_name,
            family_version: self.family_version,
            signer_public_key: signer.public_key(),
            batcher_public_key,
            inputs: self.inputs,
            outputs: self.outputs,
            payload_hash: Blake3Hash::hash(&self.payload),
        };

        let header_signature = signer.sign(&transaction_header_bytes(&header));

        Transaction {
            header,
            header_signature,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressPrefix;
    use crate::crypto::Keypair;

    fn sample(signer: &Keypair, batcher: &Keypair) -> Transaction {
        let addr = Address::derive(AddressPrefix::Measurement, &signer.public_key());
        TransactionBuilder::new("PublishMeasurementRequest", "0.1")
            .input(addr.clone())
            .output(addr)
            .payload(b"payload".to_vec())
            .sign(batcher.public_key(), signer)
    }

    #[test]
    fn test_transaction_sign_and_verify() {
        let signer = Keypair::from_secret_bytes(&[0x11; 32]).unwrap();
        let batcher = Keypair::from_secret_bytes(&[0x22; 32]).unwrap();
        let tx = sample(&signer, &batcher);

        tx.verify().expect("freshly signed transaction should verify");
        assert_eq!(tx.signer(), &signer.public_key());
        assert_eq!(tx.header.batcher_public_key, batcher.public_key());
        assert_eq!(tx.id().as_bytes(), tx.header_signature.as_bytes());
    }

    #[test]
    fn test_transaction_is_deterministic() {
        let signer = Keypair::from_secret_bytes(&[0x11; 32]).unwrap();
        let batcher = Keypair::from_secret_bytes(&[0x22; 32]).unwrap();
        assert_eq!(sample(&signer, &batcher), sample(&signer, &batcher));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let signer = Keypair::from_secret_bytes(&[0x11; 32]).unwrap();
        let batcher = Keypair::from_secret_bytes(&[0x22; 32]).unwrap();
        let mut tx = sample(&signer, &batcher);
        tx.payload = Bytes::from_static(b"other");
        assert!(matches!(
            tx.verify(),
            Err(CoreError::PayloadHashMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_header_fails() {
        let signer = Keypair::from_secret_bytes(&[0x11; 32]).unwrap();
        let batcher = Keypair::from_secret_bytes(&[0x22; 32]).unwrap();
        let mut tx = sample(&signer, &batcher);
        tx.header.outputs.clear();
        assert!(matches!(tx.verify(), Err(CoreError::InvalidSignature)));
    }
}
