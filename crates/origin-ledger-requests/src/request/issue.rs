use origin_ledger_core::{Address, AddressPrefix, ExtendedKey, PublicKey, Transaction};

use super::{sign_transaction, signing_key, Compile};
use crate::error::Result;
use crate::payload::IssueGgoPayload;

/// Issue a certificate against a production measurement.
///
/// Reads the measurement and writes the certificate; signed by the owner
/// of the measurement.
#[derive(Debug, Clone)]
pub struct IssueGgo {
    pub key: ExtendedKey,
    pub measurement_address: Address,
    pub ggo_address: Address,
    pub tech_type: String,
    pub fuel_type: String,
}

impl IssueGgo {
    /// Issue at the certificate address derived from the measurement key.
    pub fn new(key: ExtendedKey, tech_type: impl Into<String>, fuel_type: impl Into<String>) -> Self {
        Self {
            measurement_address: key.address(AddressPrefix::Measurement),
            ggo_address: key.address(AddressPrefix::Ggo),
            key,
            tech_type: tech_type.into(),
            fuel_type: fuel_type.into(),
        }
    }
}

impl Compile for IssueGgo {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        let signer = signing_key(&self.key, "measurement")?;

        let payload = IssueGgoPayload {
            origin: self.measurement_address.clone(),
            tech_type: self.tech_type.clone(),
            fuel_type: self.fuel_type.clone(),
            key: self.key.public_key(),
        };

        Ok(vec![sign_transaction(
            &payload,
            &signer,
            batcher,
            vec![self.measurement_address.clone(), self.ggo_address.clone()],
            vec![self.ggo_address.clone()],
        )?])
    }
}
