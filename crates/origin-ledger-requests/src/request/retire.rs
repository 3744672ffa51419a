use origin_ledger_core::{Address, AddressPrefix, ExtendedKey, PublicKey, Transaction};

use super::{sign_transaction, signing_key, Compile};
use crate::error::Result;
use crate::payload::{RetireGgoPayload, SettlementPayload};

/// A certificate to retire, with the key that owns it.
#[derive(Debug, Clone)]
pub struct RetirePart {
    pub address: Address,
    pub key: ExtendedKey,
}

impl RetirePart {
    /// Retire the certificate owned by `key`.
    pub fn new(key: ExtendedKey) -> Self {
        Self {
            address: key.address(AddressPrefix::Ggo),
            key,
        }
    }
}

/// Retire certificates against a consumption measurement.
///
/// Compiles to one transaction per certificate, each signed by that
/// certificate's key, followed by the settlement transaction signed by the
/// measurement key. The settlement only validates once every certificate
/// has been marked earlier in the same batch, so it always comes last.
#[derive(Debug, Clone)]
pub struct RetireGgo {
    pub measurement_key: ExtendedKey,
    pub measurement_address: Address,
    pub settlement_address: Address,
    pub parts: Vec<RetirePart>,
}

impl RetireGgo {
    /// Retire against the measurement owned by `measurement_key`, settling
    /// at the settlement address derived from the same key.
    pub fn new(measurement_key: ExtendedKey, ggo_keys: Vec<ExtendedKey>) -> Self {
        Self {
            measurement_address: measurement_key.address(AddressPrefix::Measurement),
            settlement_address: measurement_key.address(AddressPrefix::Settlement),
            measurement_key,
            parts: ggo_keys.into_iter().map(RetirePart::new).collect(),
        }
    }
}

impl Compile for RetireGgo {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        let settlement_signer = signing_key(&self.measurement_key, "measurement")?;
        let mut transactions = Vec::with_capacity(self.parts.len() + 1);

        for part in &self.parts {
            let signer = signing_key(&part.key, "certificate")?;
            let payload = RetireGgoPayload {
                origin: part.address.clone(),
                settlement_address: self.settlement_address.clone(),
            };
            transactions.push(sign_transaction(
                &payload,
                &signer,
                batcher,
                vec![part.address.clone()],
                vec![part.address.clone()],
            )?);
        }

        let ggo_addresses: Vec<Address> = self.parts.iter().map(|p| p.address.clone()).collect();

        let mut inputs = vec![
            self.settlement_address.clone(),
            self.measurement_address.clone(),
        ];
        inputs.extend(ggo_addresses.iter().cloned());

        let payload = SettlementPayload {
            settlement_address: self.settlement_address.clone(),
            measurement_address: self.measurement_address.clone(),
            ggo_addresses,
        };
        transactions.push(sign_transaction(
            &payload,
            &settlement_signer,
            batcher,
            inputs,
            vec![self.settlement_address.clone()],
        )?);

        Ok(transactions)
    }
}
