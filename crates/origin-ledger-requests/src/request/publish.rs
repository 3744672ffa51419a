use chrono::{DateTime, Utc};

use origin_ledger_core::{Address, AddressPrefix, Direction, ExtendedKey, PublicKey, Transaction};

use super::{sign_transaction, signing_key, Compile};
use crate::error::Result;
use crate::payload::PublishMeasurementPayload;

/// Publish a metered amount of energy for a time window.
///
/// Signed by the owner key; writes the owner's measurement address. The
/// address is declared as an input too, because the ledger reads it to
/// refuse a second publication at the same address.
#[derive(Debug, Clone)]
pub struct PublishMeasurement {
    pub key: ExtendedKey,
    pub measurement_address: Address,
    pub amount: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sector: String,
    pub direction: Direction,
}

impl PublishMeasurement {
    /// Publish at the measurement address derived from `key`.
    pub fn new(
        key: ExtendedKey,
        amount: u64,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        sector: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            measurement_address: key.address(AddressPrefix::Measurement),
            key,
            amount,
            begin,
            end,
            sector: sector.into(),
            direction,
        }
    }
}

impl Compile for PublishMeasurement {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        let signer = signing_key(&self.key, "measurement")?;

        let payload = PublishMeasurementPayload {
            amount: self.amount,
            begin: self.begin,
            end: self.end,
            sector: self.sector.clone(),
            direction: self.direction,
            key: self.key.public_key(),
        };

        Ok(vec![sign_transaction(
            &payload,
            &signer,
            batcher,
            vec![self.measurement_address.clone()],
            vec![self.measurement_address.clone()],
        )?])
    }
}
