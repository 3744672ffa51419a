//! Golden test vectors for deterministic verification.
//!
//! Key derivation must reproduce BIP32 test vector 1, and signing must
//! reproduce signatures produced by other SDKs for the same key and message.

use origin_ledger_core::{ChildIndex, ExtendedKey, Signature, Signer};

/// One node of a BIP32 test chain.
#[derive(Debug, Clone)]
pub struct Bip32Vector {
    /// Human-readable path, e.g. `m/0H/1`.
    pub name: &'static str,
    pub path: &'static [ChildIndex],
    /// Expected private key (hex).
    pub private_key: &'static str,
    /// Expected chain code (hex).
    pub chain_code: &'static str,
    /// Expected compressed public key (hex).
    pub public_key: &'static str,
}

/// Seed of BIP32 test vector 1.
pub const BIP32_SEED: &str = "000102030405060708090a0b0c0d0e0f";

/// BIP32 test vector 1, first four nodes.
pub fn bip32_vectors() -> Vec<Bip32Vector> {
    vec![
        Bip32Vector {
            name: "m",
            path: &[],
            private_key: "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35",
            chain_code: "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508",
            public_key: "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2",
        },
        Bip32Vector {
            name: "m/0H",
            path: &[ChildIndex::Hardened(0)],
            private_key: "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea",
            chain_code: "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141",
            public_key: "035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56",
        },
        Bip32Vector {
            name: "m/0H/1",
            path: &[ChildIndex::Hardened(0), ChildIndex::Normal(1)],
            private_key: "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368",
            chain_code: "2a7857631386ba23dacac34180dd1983734e444fdbf774041578e9b6adb37c19",
            public_key: "03501e454bf00751f24b1b489aa925215d66af2234e3891c3b21a52bedb3cd711c",
        },
        Bip32Vector {
            name: "m/0H/1/2H",
            path: &[
                ChildIndex::Hardened(0),
                ChildIndex::Normal(1),
                ChildIndex::Hardened(2),
            ],
            private_key: "cbce0d719ecf7431d88e6a89fa1483e02e35092af60c042b1df2ff59fa424dca",
            chain_code: "04466b9cc8e161e966409ca52986c584f07e9dc81f735db683c3ff6ec7b1503f",
            public_key: "0357bfe1e341d01c69fe5654309956cbea516822fba8a601743a012a7896ee8dc2",
        },
    ]
}

/// Derive the node a vector describes.
pub fn derive_vector(vector: &Bip32Vector) -> ExtendedKey {
    let seed = hex::decode(BIP32_SEED).expect("seed constant is hex");
    ExtendedKey::from_entropy(&seed)
        .and_then(|master| master.derive_path(vector.path))
        .expect("test vector paths are valid")
}

/// Check every BIP32 vector, returning `(name, matches)` per node.
pub fn verify_bip32_vectors() -> Vec<(String, bool)> {
    bip32_vectors()
        .iter()
        .map(|v| {
            let key = derive_vector(v);
            let matches = key.private_key_bytes().map(hex::encode).as_deref() == Some(v.private_key)
                && hex::encode(key.chain_code()) == v.chain_code
                && hex::encode(key.public_key_bytes()) == v.public_key;
            (v.name.to_string(), matches)
        })
        .collect()
}

/// A message signed with a master key from known entropy.
#[derive(Debug, Clone)]
pub struct SignatureVector {
    pub entropy: &'static [u8],
    pub message: &'static [u8],
    /// Expected compact signature (hex).
    pub signature: &'static str,
}

/// Signature produced by the Python SDK for the same entropy.
pub const SDK_SIGNATURE: SignatureVector = SignatureVector {
    entropy: b"bfdgafgaertaehtaha43514r<aefag",
    message: b"Hello world",
    signature: "01799dd2268934d11fcc95a164fb1b32c4a0da3284461890838f31f48e37917c\
                532174048672ba1b0f028e5d74943966e799acadd41c7aa433fcf254e794fbed",
};

/// Sign a vector's message with its master key.
pub fn sign_vector(vector: &SignatureVector) -> Signature {
    ExtendedKey::from_entropy(vector.entropy)
        .and_then(|key| key.keypair())
        .expect("vector entropy yields a valid key")
        .sign(vector.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bip32_vector_1() {
        for (name, matches) in verify_bip32_vectors() {
            assert!(matches, "BIP32 vector node {} does not match", name);
        }
    }

    #[test]
    fn test_neutered_chain_matches_private_chain() {
        let vectors = bip32_vectors();
        let parent = derive_vector(&vectors[1]);
        let child = parent.neuter().derive(1).unwrap();
        assert_eq!(hex::encode(child.public_key_bytes()), vectors[2].public_key);
        assert_eq!(hex::encode(child.chain_code()), vectors[2].chain_code);
        assert!(!child.is_private());
    }

    #[test]
    fn test_sdk_signature() {
        let signature = sign_vector(&SDK_SIGNATURE);
        assert_eq!(hex::encode(signature.as_bytes()), SDK_SIGNATURE.signature);

        let key = ExtendedKey::from_entropy(SDK_SIGNATURE.entropy).unwrap();
        assert!(key
            .public_key()
            .verify(SDK_SIGNATURE.message, &signature)
            .is_ok());
    }
}
