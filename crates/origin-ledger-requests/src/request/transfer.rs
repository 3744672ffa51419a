use origin_ledger_core::{Address, AddressPrefix, ExtendedKey, PublicKey, Transaction};

use super::{sign_transaction, signing_key, Compile};
use crate::error::Result;
use crate::payload::TransferGgoPayload;

/// Move a certificate to a new owner's address.
#[derive(Debug, Clone)]
pub struct TransferGgo {
    pub key: ExtendedKey,
    pub origin: Address,
    pub destination: Address,
}

impl TransferGgo {
    /// Transfer the certificate owned by `key` to `destination`.
    pub fn new(key: ExtendedKey, destination: Address) -> Self {
        Self {
            origin: key.address(AddressPrefix::Ggo),
            key,
            destination,
        }
    }

    /// Transfer to the certificate address of another key.
    pub fn to_key(key: ExtendedKey, new_owner: &PublicKey) -> Self {
        Self::new(key, Address::derive(AddressPrefix::Ggo, new_owner))
    }
}

impl Compile for TransferGgo {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        let signer = signing_key(&self.key, "certificate")?;

        let payload = TransferGgoPayload {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
        };

        Ok(vec![sign_transaction(
            &payload,
            &signer,
            batcher,
            vec![self.origin.clone()],
            vec![self.destination.clone()],
        )?])
    }
}
