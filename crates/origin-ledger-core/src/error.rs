//! Error types for the Origin Ledger core.

use thiserror::Error;

/// Errors raised by encoding, decoding and verifying ledger envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    /// The secret scalar is zero or not below the curve order.
    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("payload hash mismatch: expected {expected}, got {actual}")]
    PayloadHashMismatch { expected: String, actual: String },

    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("malformed batch: {0}")]
    MalformedBatch(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors raised while deriving keys from the hierarchical key tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The index is out of range, or it produced an invalid child key.
    #[error("invalid child index: {0}")]
    InvalidIndex(u32),

    /// The tree cannot grow deeper than the maximum depth.
    #[error("key tree exhausted at depth {depth}")]
    KeyExhausted { depth: u8 },

    /// The operation needs private key material this handle does not carry.
    #[error("private key material is not available")]
    MissingPrivateKey,

    /// The seed produced an invalid master key.
    #[error("seed does not produce a valid master key")]
    InvalidSeed,

    #[error("invalid public key")]
    InvalidPublicKey,

    /// Binding key material to a signer failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
