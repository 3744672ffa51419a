//! Ledger addresses.
//!
//! An address is 70 lowercase hex characters: a 6 character entity prefix
//! followed by the 64 character Blake3 digest of the owning public key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::PublicKey;
use crate::error::CoreError;

/// Length of an address in hex characters.
pub const ADDRESS_LEN: usize = 70;

/// Length of the entity prefix in hex characters.
pub const PREFIX_LEN: usize = 6;

/// Domain separator for address digests.
const ADDRESS_DOMAIN: &[u8] = b"origin-address-v0:";

/// The kind of entity an address points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressPrefix {
    Measurement,
    Ggo,
    Settlement,
}

impl AddressPrefix {
    pub const ALL: [Self; 3] = [Self::Measurement, Self::Ggo, Self::Settlement];

    /// The hex prefix written in front of the digest.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Measurement => "000001",
            Self::Ggo => "000002",
            Self::Settlement => "000003",
        }
    }

    /// Parse a hex prefix.
    pub fn from_hex(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == prefix)
    }
}

impl fmt::Display for AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Measurement => "measurement",
            Self::Ggo => "ggo",
            Self::Settlement => "settlement",
        };
        f.write_str(name)
    }
}

/// A validated ledger address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    prefix: AddressPrefix,
    value: String,
}

impl Address {
    /// Derive the address of a public key under an entity prefix.
    pub fn derive(prefix: AddressPrefix, public_key: &PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ADDRESS_DOMAIN);
        hasher.update(public_key.as_bytes());
        let digest = hasher.finalize();

        Self {
            prefix,
            value: format!("{}{}", prefix.as_str(), digest.to_hex()),
        }
    }

    /// The entity kind encoded in the prefix.
    pub fn prefix(&self) -> AddressPrefix {
        self.prefix
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// Derive the address of a public key under an entity prefix.
pub fn address(prefix: AddressPrefix, public_key: &PublicKey) -> Address {
    Address::derive(prefix, public_key)
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(CoreError::InvalidAddress(format!(
                "expected {} characters, got {}",
                ADDRESS_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CoreError::InvalidAddress(
                "expected lowercase hex characters".into(),
            ));
        }

        let prefix = AddressPrefix::from_hex(&s[..PREFIX_LEN])
            .ok_or_else(|| CoreError::InvalidAddress(format!("unknown prefix {}", &s[..PREFIX_LEN])))?;

        Ok(Self {
            prefix,
            value: s.to_owned(),
        })
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.value
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Address({}:{})",
            self.prefix.as_str(),
            &self.value[PREFIX_LEN..PREFIX_LEN + 12]
        )
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, Signer};
    use proptest::prelude::*;

    fn key(seed: u8) -> PublicKey {
        Keypair::from_secret_bytes(&[seed; 32]).unwrap().public_key()
    }

    #[test]
    fn test_address_shape() {
        let addr = address(AddressPrefix::Ggo, &key(1));
        assert_eq!(addr.as_str().len(), ADDRESS_LEN);
        assert!(addr.as_str().starts_with("000002"));
        assert_eq!(addr.prefix(), AddressPrefix::Ggo);
    }

    #[test]
    fn test_prefixes_separate_entities() {
        let pk = key(2);
        let m = address(AddressPrefix::Measurement, &pk);
        let g = address(AddressPrefix::Ggo, &pk);
        let s = address(AddressPrefix::Settlement, &pk);
        assert_ne!(m, g);
        assert_ne!(g, s);
        assert_eq!(m.as_str()[PREFIX_LEN..], g.as_str()[PREFIX_LEN..]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let valid = address(AddressPrefix::Settlement, &key(3)).to_string();
        assert_eq!(valid.parse::<Address>().unwrap().prefix(), AddressPrefix::Settlement);

        assert!(valid[..69].parse::<Address>().is_err());
        assert!(valid.to_uppercase().parse::<Address>().is_err());
        let unknown = format!("000009{}", &valid[PREFIX_LEN..]);
        assert!(unknown.parse::<Address>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let addr = address(AddressPrefix::Measurement, &key(4));
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_address_is_deterministic(secret in prop::array::uniform32(1u8..)) {
            let pk = Keypair::from_secret_bytes(&secret).unwrap().public_key();
            for prefix in AddressPrefix::ALL {
                let a = address(prefix, &pk);
                prop_assert_eq!(&a, &address(prefix, &pk));
                prop_assert_eq!(a.prefix(), prefix);
                prop_assert_eq!(a.to_string().parse::<Address>().unwrap(), a);
            }
        }
    }
}
