use origin_ledger_core::{Address, AddressPrefix, ExtendedKey, PublicKey, Transaction};

use super::{sign_transaction, signing_key, Compile};
use crate::error::Result;
use crate::payload::{SplitGgoPart, SplitGgoPayload};

/// One destination of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    pub address: Address,
    pub amount: u64,
}

impl SplitPart {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// Split a certificate into parts at new addresses.
///
/// The part amounts must add up to the source amount. That is checked by
/// the ledger when the batch executes, not here: the compiler has no view
/// of ledger state.
#[derive(Debug, Clone)]
pub struct SplitGgo {
    pub key: ExtendedKey,
    pub origin: Address,
    pub parts: Vec<SplitPart>,
}

impl SplitGgo {
    /// Split the certificate owned by `key`.
    pub fn new(key: ExtendedKey, parts: Vec<SplitPart>) -> Self {
        Self {
            origin: key.address(AddressPrefix::Ggo),
            key,
            parts,
        }
    }
}

impl Compile for SplitGgo {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        let signer = signing_key(&self.key, "certificate")?;

        let payload = SplitGgoPayload {
            origin: self.origin.clone(),
            parts: self
                .parts
                .iter()
                .map(|p| SplitGgoPart {
                    address: p.address.clone(),
                    amount: p.amount,
                })
                .collect(),
        };

        Ok(vec![sign_transaction(
            &payload,
            &signer,
            batcher,
            vec![self.origin.clone()],
            self.parts.iter().map(|p| p.address.clone()).collect(),
        )?])
    }
}
