//! Domain records stored in ledger state.
//!
//! Records are stored as JSON. The address a record lives at is not part of
//! the stored bytes; readers stamp it on after fetching.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressPrefix};
use crate::crypto::PublicKey;
use crate::error::CoreError;

/// Whether a measurement records energy produced or consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Production,
    Consumption,
}

/// Metered energy over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub amount: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sector: String,
    pub direction: Direction,
    /// Owner public key.
    pub key: PublicKey,
}

/// A certificate of origin (GGO) for produced energy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ggo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub amount: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sector: String,
    pub tech_type: String,
    pub fuel_type: String,
    /// Owner public key.
    pub key: PublicKey,
}

/// One certificate's share in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPart {
    pub ggo_address: Address,
    pub amount: u64,
}

/// Certificates retired against a consumption measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub measurement_address: Address,
    pub parts: Vec<SettlementPart>,
}

impl Settlement {
    /// Total amount retired so far.
    pub fn retired_amount(&self) -> u64 {
        self.parts.iter().map(|p| p.amount).sum()
    }
}

/// A record type living under one address prefix.
pub trait LedgerRecord: Serialize + DeserializeOwned {
    const PREFIX: AddressPrefix;

    fn address(&self) -> Option<&Address>;

    /// Record the address this value was read from.
    fn stamp(&mut self, address: Address);

    fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

macro_rules! ledger_record {
    ($ty:ty, $prefix:expr) => {
        impl LedgerRecord for $ty {
            const PREFIX: AddressPrefix = $prefix;

            fn address(&self) -> Option<&Address> {
                self.address.as_ref()
            }

            fn stamp(&mut self, address: Address) {
                self.address = Some(address);
            }
        }
    };
}

ledger_record!(Measurement, AddressPrefix::Measurement);
ledger_record!(Ggo, AddressPrefix::Ggo);
ledger_record!(Settlement, AddressPrefix::Settlement);

/// A record decoded according to the prefix of the address it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRecord {
    Measurement(Measurement),
    Ggo(Ggo),
    Settlement(Settlement),
}

impl ResolvedRecord {
    /// Decode state bytes read from `address` and stamp the address on.
    pub fn decode(address: &Address, bytes: &[u8]) -> Result<Self, CoreError> {
        fn read<R: LedgerRecord>(address: &Address, bytes: &[u8]) -> Result<R, CoreError> {
            let mut record = R::from_bytes(bytes)?;
            record.stamp(address.clone());
            Ok(record)
        }

        Ok(match address.prefix() {
            AddressPrefix::Measurement => Self::Measurement(read(address, bytes)?),
            AddressPrefix::Ggo => Self::Ggo(read(address, bytes)?),
            AddressPrefix::Settlement => Self::Settlement(read(address, bytes)?),
        })
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Measurement(m) => m.address(),
            Self::Ggo(g) => g.address(),
            Self::Settlement(s) => s.address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, Signer};
    use chrono::TimeZone;

    fn owner() -> PublicKey {
        Keypair::from_secret_bytes(&[0x42; 32]).unwrap().public_key()
    }

    fn measurement() -> Measurement {
        Measurement {
            address: None,
            amount: 1024,
            begin: Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 1, 1, 13, 0, 0).unwrap(),
            sector: "DK1".into(),
            direction: Direction::Production,
            key: owner(),
        }
    }

    #[test]
    fn test_stored_bytes_omit_address() {
        let bytes = measurement().to_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("address").is_none());
        assert_eq!(json["direction"], "PRODUCTION");
        assert_eq!(json["begin"], "2020-01-01T12:00:00Z");
    }

    #[test]
    fn test_decode_stamps_address() {
        let addr = Address::derive(AddressPrefix::Measurement, &owner());
        let bytes = measurement().to_bytes().unwrap();

        let record = ResolvedRecord::decode(&addr, &bytes).unwrap();
        let ResolvedRecord::Measurement(m) = &record else {
            panic!("expected a measurement, got {:?}", record);
        };
        assert_eq!(m.address.as_ref(), Some(&addr));
        assert_eq!(m.amount, 1024);
        assert_eq!(record.address(), Some(&addr));
    }

    #[test]
    fn test_decode_kind_follows_prefix() {
        let addr = Address::derive(AddressPrefix::Ggo, &owner());
        let bytes = measurement().to_bytes().unwrap();
        assert!(matches!(
            ResolvedRecord::decode(&addr, &bytes),
            Err(CoreError::DecodingError(_))
        ));
    }

    #[test]
    fn test_settlement_amount() {
        let ggo = Address::derive(AddressPrefix::Ggo, &owner());
        let settlement = Settlement {
            address: None,
            measurement_address: Address::derive(AddressPrefix::Measurement, &owner()),
            parts: vec![
                SettlementPart { ggo_address: ggo.clone(), amount: 10 },
                SettlementPart { ggo_address: ggo, amount: 15 },
            ],
        };
        assert_eq!(settlement.retired_amount(), 25);
        let back = Settlement::from_bytes(&settlement.to_bytes().unwrap()).unwrap();
        assert_eq!(back, settlement);
    }
}
