//! Transaction payloads.
//!
//! Each transaction family carries one CBOR-encoded payload type. Validators
//! dispatch on the family name in the transaction header and decode the
//! payload accordingly.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use origin_ledger_core::{Address, Direction, PublicKey};

use crate::error::{RequestError, Result};

/// Version string every family is published under.
pub const FAMILY_VERSION: &str = "0.1";

/// The transaction families this SDK produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    PublishMeasurement,
    IssueGgo,
    SplitGgo,
    TransferGgo,
    RetireGgo,
    Settlement,
}

impl Family {
    pub const ALL: [Self; 6] = [
        Self::PublishMeasurement,
        Self::IssueGgo,
        Self::SplitGgo,
        Self::TransferGgo,
        Self::RetireGgo,
        Self::Settlement,
    ];

    /// The family name written into transaction headers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PublishMeasurement => "PublishMeasurementRequest",
            Self::IssueGgo => "IssueGGORequest",
            Self::SplitGgo => "SplitGGORequest",
            Self::TransferGgo => "TransferGGORequest",
            Self::RetireGgo => "RetireGGORequest",
            Self::Settlement => "SettlementRequest",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A payload type bound to its transaction family.
pub trait Payload: Serialize + DeserializeOwned {
    const FAMILY: Family;

    /// Serialize to CBOR bytes.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| RequestError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| RequestError::Payload(e.to_string()))
    }
}

/// Payload for publishing a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMeasurementPayload {
    pub amount: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sector: String,
    pub direction: Direction,
    /// Owner public key.
    pub key: PublicKey,
}

/// Payload for issuing a certificate against a production measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueGgoPayload {
    /// The measurement the certificate is issued against.
    pub origin: Address,
    pub tech_type: String,
    pub fuel_type: String,
    pub key: PublicKey,
}

/// One destination of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitGgoPart {
    pub address: Address,
    pub amount: u64,
}

/// Payload for splitting a certificate into parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitGgoPayload {
    pub origin: Address,
    pub parts: Vec<SplitGgoPart>,
}

/// Payload for moving a certificate to a new address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferGgoPayload {
    pub origin: Address,
    pub destination: Address,
}

/// Payload marking one certificate as consumed by a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetireGgoPayload {
    pub origin: Address,
    pub settlement_address: Address,
}

/// Payload writing the settlement for previously marked certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPayload {
    pub settlement_address: Address,
    pub measurement_address: Address,
    pub ggo_addresses: Vec<Address>,
}

impl Payload for PublishMeasurementPayload {
    const FAMILY: Family = Family::PublishMeasurement;
}

impl Payload for IssueGgoPayload {
    const FAMILY: Family = Family::IssueGgo;
}

impl Payload for SplitGgoPayload {
    const FAMILY: Family = Family::SplitGgo;
}

impl Payload for TransferGgoPayload {
    const FAMILY: Family = Family::TransferGgo;
}

impl Payload for RetireGgoPayload {
    const FAMILY: Family = Family::RetireGgo;
}

impl Payload for SettlementPayload {
    const FAMILY: Family = Family::Settlement;
}

/// Any payload this SDK produces, decoded by family name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerPayload {
    PublishMeasurement(PublishMeasurementPayload),
    IssueGgo(IssueGgoPayload),
    SplitGgo(SplitGgoPayload),
    TransferGgo(TransferGgoPayload),
    RetireGgo(RetireGgoPayload),
    Settlement(SettlementPayload),
}

impl LedgerPayload {
    /// Decode a payload given the family name from its transaction header.
    pub fn decode(family_name: &str, bytes: &[u8]) -> Result<Self> {
        let family = Family::from_name(family_name)
            .ok_or_else(|| RequestError::UnknownFamily(family_name.to_owned()))?;

        Ok(match family {
            Family::PublishMeasurement => Self::PublishMeasurement(Payload::from_bytes(bytes)?),
            Family::IssueGgo => Self::IssueGgo(Payload::from_bytes(bytes)?),
            Family::SplitGgo => Self::SplitGgo(Payload::from_bytes(bytes)?),
            Family::TransferGgo => Self::TransferGgo(Payload::from_bytes(bytes)?),
            Family::RetireGgo => Self::RetireGgo(Payload::from_bytes(bytes)?),
            Family::Settlement => Self::Settlement(Payload::from_bytes(bytes)?),
        })
    }

    pub fn family(&self) -> Family {
        match self {
            Self::PublishMeasurement(_) => Family::PublishMeasurement,
            Self::IssueGgo(_) => Family::IssueGgo,
            Self::SplitGgo(_) => Family::SplitGgo,
            Self::TransferGgo(_) => Family::TransferGgo,
            Self::RetireGgo(_) => Family::RetireGgo,
            Self::Settlement(_) => Family::Settlement,
        }
    }
}
