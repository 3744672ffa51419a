//! Strong identifier types for the Origin Ledger.
//!
//! Transaction and batch ids are the header signatures of the envelopes
//! they name, so both are 64-byte values rendered as 128 hex characters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::{Signature, SIGNATURE_LEN};

macro_rules! signature_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; SIGNATURE_LEN]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                if bytes.len() != SIGNATURE_LEN {
                    return Err(hex::FromHexError::InvalidStringLength);
                }
                let mut arr = [0u8; SIGNATURE_LEN];
                arr.copy_from_slice(&bytes);
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Signature> for $name {
            fn from(signature: Signature) -> Self {
                Self(signature.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

signature_id! {
    /// A transaction identifier: the signature over the transaction header.
    TransactionId
}

signature_id! {
    /// A batch identifier: the signature over the batch header.
    BatchId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_roundtrip() {
        let id = TransactionId::from_bytes([0x42; 64]);
        let recovered = TransactionId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
        assert!(TransactionId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_id_display_is_full_hex() {
        let id = BatchId::from_bytes([0xab; 64]);
        assert_eq!(format!("{}", id).len(), 128);
    }

    #[test]
    fn test_id_debug() {
        let id = BatchId::from_bytes([0xcd; 64]);
        assert_eq!(format!("{:?}", id), "BatchId(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_id_serde_as_hex() {
        let id = TransactionId::from(Signature::from_bytes([0x01; 64]));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
