//! Hierarchical deterministic keys (BIP32 over secp256k1).
//!
//! An [`ExtendedKey`] is an immutable value: deriving a child never touches
//! the parent. Hardened children need the private scalar; normal children
//! can also be derived from a public-only handle, and the two paths agree.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::group::Curve;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, ProjectivePoint, Scalar, SecretKey};
use sha2::Sha512;
use std::fmt;

use crate::address::{Address, AddressPrefix};
use crate::crypto::{Keypair, PublicKey};
use crate::error::KeyError;

type HmacSha512 = Hmac<Sha512>;

/// Child numbers at or above this offset are hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Deepest level the key tree can reach.
pub const MAX_DEPTH: u8 = u8::MAX;

/// HMAC key for master key generation.
const MASTER_SEED_KEY: &[u8] = b"Bitcoin seed";

/// One step of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildIndex {
    Normal(u32),
    Hardened(u32),
}

/// A node of the key tree.
#[derive(Clone)]
pub struct ExtendedKey {
    secret: Option<SecretKey>,
    public: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    child_number: u32,
}

impl ExtendedKey {
    /// Create a master key from seed entropy.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, KeyError> {
        let digest = hmac_sha512(MASTER_SEED_KEY, &[entropy]);
        let (il, ir) = digest.split_at(32);

        let secret = SecretKey::from_slice(il).map_err(|_| KeyError::InvalidSeed)?;
        Ok(Self::with_secret(secret, chain_code(ir), 0, 0))
    }

    /// Create a master key from fresh OS randomness.
    pub fn generate() -> Self {
        loop {
            let mut seed = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut seed);
            // An invalid master key has probability below 2^-127.
            if let Ok(key) = Self::from_entropy(&seed) {
                return key;
            }
        }
    }

    /// Create a public-only handle from its parts.
    pub fn from_public(public: PublicKey, chain_code: [u8; 32]) -> Self {
        Self {
            secret: None,
            public,
            chain_code,
            depth: 0,
            child_number: 0,
        }
    }

    fn with_secret(secret: SecretKey, chain_code: [u8; 32], depth: u8, child_number: u32) -> Self {
        let public = PublicKey::from(&secret.public_key());
        Self {
            secret: Some(secret),
            public,
            chain_code,
            depth,
            child_number,
        }
    }

    /// Derive the normal (non-hardened) child at `index`.
    ///
    /// Works on public-only handles.
    pub fn derive(&self, index: u32) -> Result<Self, KeyError> {
        if index >= HARDENED_OFFSET {
            return Err(KeyError::InvalidIndex(index));
        }
        self.derive_child(index)
    }

    /// Derive the hardened child at `index`.
    pub fn derive_hardened(&self, index: u32) -> Result<Self, KeyError> {
        if index >= HARDENED_OFFSET {
            return Err(KeyError::InvalidIndex(index));
        }
        self.derive_child(index | HARDENED_OFFSET)
    }

    /// Derive along a path, one step at a time.
    pub fn derive_path(&self, path: &[ChildIndex]) -> Result<Self, KeyError> {
        let mut key = self.clone();
        for step in path {
            key = match *step {
                ChildIndex::Normal(i) => key.derive(i)?,
                ChildIndex::Hardened(i) => key.derive_hardened(i)?,
            };
        }
        Ok(key)
    }

    fn derive_child(&self, child_number: u32) -> Result<Self, KeyError> {
        if self.depth == MAX_DEPTH {
            return Err(KeyError::KeyExhausted { depth: self.depth });
        }

        let index_bytes = child_number.to_be_bytes();
        let digest = if child_number >= HARDENED_OFFSET {
            let secret = self.secret.as_ref().ok_or(KeyError::MissingPrivateKey)?;
            let secret_bytes = secret.to_bytes();
            hmac_sha512(
                &self.chain_code,
                &[&[0u8], secret_bytes.as_slice(), &index_bytes],
            )
        } else {
            hmac_sha512(&self.chain_code, &[self.public.as_bytes(), &index_bytes])
        };
        let (il, ir) = digest.split_at(32);

        let invalid = KeyError::InvalidIndex(child_number & !HARDENED_OFFSET);
        let tweak: Scalar =
            Option::from(Scalar::from_repr(*FieldBytes::from_slice(il))).ok_or(invalid.clone())?;
        let depth = self.depth + 1;

        match &self.secret {
            Some(secret) => {
                let child = tweak + *secret.to_nonzero_scalar();
                let child: NonZeroScalar =
                    Option::from(NonZeroScalar::new(child)).ok_or(invalid)?;
                Ok(Self::with_secret(
                    SecretKey::from(child),
                    chain_code(ir),
                    depth,
                    child_number,
                ))
            }
            None => {
                let parent = self
                    .public
                    .to_point()
                    .map_err(|_| KeyError::InvalidPublicKey)?;
                let point = ProjectivePoint::GENERATOR * tweak + parent.to_projective();
                let child =
                    k256::PublicKey::from_affine(point.to_affine()).map_err(|_| invalid)?;
                Ok(Self {
                    secret: None,
                    public: PublicKey::from(&child),
                    chain_code: chain_code(ir),
                    depth,
                    child_number,
                })
            }
        }
    }

    /// Drop the private material, keeping a handle that derives the same
    /// normal children.
    pub fn neuter(&self) -> Self {
        Self {
            secret: None,
            ..self.clone()
        }
    }

    /// Get the compressed public key.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Get the compressed public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        *self.public.as_bytes()
    }

    /// Get the private scalar, if this handle carries one.
    pub fn private_key_bytes(&self) -> Option<[u8; 32]> {
        self.secret.as_ref().map(|secret| {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&secret.to_bytes());
            bytes
        })
    }

    /// Whether this handle carries private material.
    pub fn is_private(&self) -> bool {
        self.secret.is_some()
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    /// Bind the private key to a signing capability.
    pub fn keypair(&self) -> Result<Keypair, KeyError> {
        let secret = self.private_key_bytes().ok_or(KeyError::MissingPrivateKey)?;
        Ok(Keypair::from_secret_bytes(&secret)?)
    }

    /// The ledger address of this key under the given entity prefix.
    pub fn address(&self, prefix: AddressPrefix) -> Address {
        Address::derive(prefix, &self.public)
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public", &self.public)
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("private", &self.is_private())
            .finish()
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn chain_code(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Signer;
    use crate::error::CoreError;

    fn master() -> ExtendedKey {
        ExtendedKey::from_entropy(&hex::decode("000102030405060708090a0b0c0d0e0f").unwrap())
            .unwrap()
    }

    #[test]
    fn test_bip32_vector_1_master() {
        let key = master();
        assert_eq!(
            hex::encode(key.private_key_bytes().unwrap()),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(key.chain_code()),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            key.public_key().to_hex(),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
    }

    #[test]
    fn test_bip32_vector_1_path() {
        let key = master()
            .derive_path(&[ChildIndex::Hardened(0), ChildIndex::Normal(1)])
            .unwrap();
        assert_eq!(
            hex::encode(key.private_key_bytes().unwrap()),
            "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368"
        );
        assert_eq!(
            key.public_key().to_hex(),
            "03501e454bf00751f24b1b489aa925215d66af2234e3891c3b21a52bedb3cd711c"
        );
        assert_eq!(key.depth(), 2);
        assert_eq!(key.child_number(), 1);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = master().derive(7).unwrap();
        let b = master().derive(7).unwrap();
        assert_eq!(a.private_key_bytes(), b.private_key_bytes());
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), master().derive(8).unwrap().public_key());
    }

    #[test]
    fn test_neutered_derivation_matches_private() {
        let parent = master().derive_hardened(0).unwrap();
        let private_child = parent.derive(1).unwrap();
        let public_child = parent.neuter().derive(1).unwrap();

        assert_eq!(private_child.public_key(), public_child.public_key());
        assert_eq!(private_child.chain_code(), public_child.chain_code());
        assert!(public_child.private_key_bytes().is_none());
    }

    #[test]
    fn test_hardened_needs_private() {
        let public = master().neuter();
        assert_eq!(
            public.derive_hardened(0).unwrap_err(),
            KeyError::MissingPrivateKey
        );
    }

    #[test]
    fn test_index_out_of_range() {
        assert_eq!(
            master().derive(HARDENED_OFFSET).unwrap_err(),
            KeyError::InvalidIndex(HARDENED_OFFSET)
        );
        assert_eq!(
            master().derive_hardened(u32::MAX).unwrap_err(),
            KeyError::InvalidIndex(u32::MAX)
        );
    }

    #[test]
    fn test_depth_exhaustion() {
        let mut key = master().neuter();
        for _ in 0..MAX_DEPTH {
            key = key.derive(0).unwrap();
        }
        assert_eq!(key.depth(), MAX_DEPTH);
        assert_eq!(
            key.derive(0).unwrap_err(),
            KeyError::KeyExhausted { depth: MAX_DEPTH }
        );
    }

    #[test]
    fn test_keypair_matches_public_key() {
        let key = master().derive(3).unwrap();
        let keypair = key.keypair().unwrap();
        assert_eq!(keypair.public_key(), key.public_key());
        assert_eq!(
            key.neuter().keypair().unwrap_err(),
            KeyError::MissingPrivateKey
        );
    }

    #[test]
    fn test_secret_key_errors_keep_their_kind() {
        let err: KeyError = CoreError::InvalidSecretKey.into();
        assert_eq!(err, KeyError::Core(CoreError::InvalidSecretKey));
        assert_ne!(err, KeyError::InvalidSeed);
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = master();
        let secret = hex::encode(key.private_key_bytes().unwrap());
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&secret));
    }
}
