//! Canonical CBOR encoding for the ledger wire format.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! Headers are signed over exactly these bytes, so the same header must
//! produce identical bytes on every platform. Decoders re-encode what they
//! read and reject any input that is not already canonical.

use bytes::Bytes;
use ciborium::value::Value;
use std::borrow::Cow;

use crate::address::Address;
use crate::batch::{BatchHeader, BatchList, SignedBatch};
use crate::crypto::{Blake3Hash, PublicKey, Signature, SIGNATURE_LEN};
use crate::error::CoreError;
use crate::transaction::{Transaction, TransactionHeader};
use crate::types::TransactionId;

/// Map keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub mod tx_header {
        pub const VERSION: u64 = 0;
        pub const FAMILY_NAME: u64 = 1;
        pub const FAMILY_VERSION: u64 = 2;
        pub const SIGNER: u64 = 3;
        pub const BATCHER: u64 = 4;
        pub const INPUTS: u64 = 5;
        pub const OUTPUTS: u64 = 6;
        pub const PAYLOAD_HASH: u64 = 7;
    }

    pub mod batch_header {
        pub const VERSION: u64 = 0;
        pub const SIGNER: u64 = 1;
        pub const TRANSACTION_IDS: u64 = 2;
    }

    /// Shared by transaction and batch envelopes.
    pub mod envelope {
        pub const HEADER: u64 = 0;
        pub const HEADER_SIGNATURE: u64 = 1;
        pub const BODY: u64 = 2;
    }

    pub mod batch_list {
        pub const BATCHES: u64 = 0;
    }
}

/// Encode a transaction header to canonical CBOR bytes.
pub fn transaction_header_bytes(header: &TransactionHeader) -> Vec<u8> {
    transaction_header_value(header).to_vec()
}

/// Encode a batch header to canonical CBOR bytes.
pub fn batch_header_bytes(header: &BatchHeader) -> Vec<u8> {
    batch_header_value(header).to_vec()
}

/// Encode a batch list to canonical CBOR bytes.
///
/// Headers are embedded as byte strings holding their canonical encoding,
/// so a receiver can verify signatures over the exact bytes it received.
pub fn batch_list_bytes(list: &BatchList) -> Vec<u8> {
    let batches = list.batches.iter().map(batch_value).collect();
    Cbor::Map(vec![(keys::batch_list::BATCHES, Cbor::Array(batches))]).to_vec()
}

const MAJOR_UINT: u8 = 0;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

/// The CBOR subset the wire format is built from.
///
/// Maps are keyed by unsigned integers. There are no floats, tags, negative
/// integers or simple values, so every tree has exactly one encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cbor<'a> {
    Uint(u64),
    Bytes(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
    Array(Vec<Cbor<'a>>),
    Map(Vec<(u64, Cbor<'a>)>),
}

impl<'a> Cbor<'a> {
    fn bytes(bytes: &'a [u8]) -> Self {
        Self::Bytes(Cow::Borrowed(bytes))
    }

    fn text(text: &'a str) -> Self {
        Self::Text(Cow::Borrowed(text))
    }

    fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Uint(n) => write_head(out, MAJOR_UINT, *n),
            Self::Bytes(bytes) => {
                write_head(out, MAJOR_BYTES, bytes.len() as u64);
                out.extend_from_slice(bytes);
            }
            Self::Text(text) => {
                write_head(out, MAJOR_TEXT, text.len() as u64);
                out.extend_from_slice(text.as_bytes());
            }
            Self::Array(items) => {
                write_head(out, MAJOR_ARRAY, items.len() as u64);
                for item in items {
                    item.write(out);
                }
            }
            Self::Map(entries) => {
                // Shortest-form unsigned keys sort bytewise in numeric order.
                let mut sorted: Vec<&(u64, Cbor<'a>)> = entries.iter().collect();
                sorted.sort_by_key(|(key, _)| *key);

                write_head(out, MAJOR_MAP, sorted.len() as u64);
                for (key, value) in sorted {
                    write_head(out, MAJOR_UINT, *key);
                    value.write(out);
                }
            }
        }
    }

    /// Narrow a parsed value to the wire subset.
    fn from_value(value: &'a Value) -> Result<Self, CoreError> {
        match value {
            Value::Integer(_) => uint_of(value).map(Self::Uint),
            Value::Bytes(bytes) => Ok(Self::bytes(bytes)),
            Value::Text(text) => Ok(Self::text(text)),
            Value::Array(items) => items
                .iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::Map(entries) => {
                let mut map: Vec<(u64, Cbor<'a>)> = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = uint_of(key)?;
                    if map.iter().any(|(seen, _)| *seen == key) {
                        return Err(CoreError::DecodingError(format!("duplicate map key {}", key)));
                    }
                    map.push((key, Self::from_value(value)?));
                }
                Ok(Self::Map(map))
            }
            Value::Float(_) => Err(CoreError::DecodingError("floats are not allowed".into())),
            _ => Err(CoreError::DecodingError("unsupported CBOR value".into())),
        }
    }
}

fn uint_of(value: &Value) -> Result<u64, CoreError> {
    match value {
        Value::Integer(i) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::DecodingError("negative integers are not allowed".into())),
        _ => Err(CoreError::DecodingError("map keys must be unsigned integers".into())),
    }
}

/// Write a major type and argument in shortest form.
fn write_head(out: &mut Vec<u8>, major: u8, n: u64) {
    let major = major << 5;
    match n {
        0..=23 => out.push(major | n as u8),
        24..=0xff => out.extend_from_slice(&[major | 24, n as u8]),
        0x100..=0xffff => {
            out.push(major | 25);
            out.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major | 26);
            out.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            out.push(major | 27);
            out.extend_from_slice(&n.to_be_bytes());
        }
    }
}

fn address_array(addresses: &[Address]) -> Cbor<'_> {
    Cbor::Array(addresses.iter().map(|a| Cbor::text(a.as_str())).collect())
}

fn transaction_header_value(header: &TransactionHeader) -> Cbor<'_> {
    use keys::tx_header as k;

    Cbor::Map(vec![
        (k::VERSION, Cbor::Uint(header.version.into())),
        (k::FAMILY_NAME, Cbor::text(&header.family_name)),
        (k::FAMILY_VERSION, Cbor::text(&header.family_version)),
        (k::SIGNER, Cbor::bytes(header.signer_public_key.as_bytes())),
        (k::BATCHER, Cbor::bytes(header.batcher_public_key.as_bytes())),
        (k::INPUTS, address_array(&header.inputs)),
        (k::OUTPUTS, address_array(&header.outputs)),
        (k::PAYLOAD_HASH, Cbor::bytes(header.payload_hash.as_bytes())),
    ])
}

fn batch_header_value(header: &BatchHeader) -> Cbor<'_> {
    use keys::batch_header as k;

    let ids = header
        .transaction_ids
        .iter()
        .map(|id| Cbor::bytes(id.as_bytes()))
        .collect();

    Cbor::Map(vec![
        (k::VERSION, Cbor::Uint(header.version.into())),
        (k::SIGNER, Cbor::bytes(header.signer_public_key.as_bytes())),
        (k::TRANSACTION_IDS, Cbor::Array(ids)),
    ])
}

fn transaction_value(tx: &Transaction) -> Cbor<'_> {
    use keys::envelope as k;

    Cbor::Map(vec![
        (k::HEADER, Cbor::Bytes(Cow::Owned(transaction_header_bytes(&tx.header)))),
        (k::HEADER_SIGNATURE, Cbor::bytes(tx.header_signature.as_bytes())),
        (k::BODY, Cbor::bytes(&tx.payload)),
    ])
}

fn batch_value(batch: &SignedBatch) -> Cbor<'_> {
    use keys::envelope as k;

    let transactions = batch.transactions.iter().map(transaction_value).collect();

    Cbor::Map(vec![
        (k::HEADER, Cbor::Bytes(Cow::Owned(batch_header_bytes(&batch.header)))),
        (k::HEADER_SIGNATURE, Cbor::bytes(batch.header_signature.as_bytes())),
        (k::BODY, Cbor::Array(transactions)),
    ])
}

/// Parse one CBOR value and require `bytes` to be its canonical encoding.
fn decode_canonical(bytes: &[u8], what: &str) -> Result<Value, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if Cbor::from_value(&value)?.to_vec() != bytes {
        return Err(CoreError::DecodingError(format!(
            "{} is not canonically encoded",
            what
        )));
    }
    Ok(value)
}

/// Field accessors over an integer-keyed map.
struct Fields<'a> {
    map: &'a [(Value, Value)],
    what: &'static str,
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value, what: &'static str) -> Result<Self, CoreError> {
        match value {
            Value::Map(map) => Ok(Self { map, what }),
            _ => Err(malformed(what, "expected map")),
        }
    }

    fn get(&self, key: u64) -> Option<&'a Value> {
        self.map
            .iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
            .map(|(_, v)| v)
    }

    fn uint(&self, key: u64, name: &str) -> Result<u64, CoreError> {
        match self.get(key) {
            Some(Value::Integer(i)) => {
                u64::try_from(i128::from(*i)).map_err(|_| malformed(self.what, name))
            }
            _ => Err(malformed(self.what, name)),
        }
    }

    fn bytes(&self, key: u64, name: &str) -> Result<&'a [u8], CoreError> {
        match self.get(key) {
            Some(Value::Bytes(b)) => Ok(b),
            _ => Err(malformed(self.what, name)),
        }
    }

    fn text(&self, key: u64, name: &str) -> Result<&'a str, CoreError> {
        match self.get(key) {
            Some(Value::Text(s)) => Ok(s),
            _ => Err(malformed(self.what, name)),
        }
    }

    fn array(&self, key: u64, name: &str) -> Result<&'a [Value], CoreError> {
        match self.get(key) {
            Some(Value::Array(a)) => Ok(a),
            _ => Err(malformed(self.what, name)),
        }
    }

    fn version(&self, key: u64) -> Result<u8, CoreError> {
        let n = self.uint(key, "version")?;
        u8::try_from(n).map_err(|_| malformed(self.what, "version"))
    }

    fn public_key(&self, key: u64, name: &str) -> Result<PublicKey, CoreError> {
        PublicKey::from_slice(self.bytes(key, name)?).map_err(|_| malformed(self.what, name))
    }

    fn signature(&self, key: u64, name: &str) -> Result<Signature, CoreError> {
        let bytes: [u8; SIGNATURE_LEN] = self
            .bytes(key, name)?
            .try_into()
            .map_err(|_| malformed(self.what, name))?;
        Ok(Signature(bytes))
    }
}

fn malformed(what: &str, field: &str) -> CoreError {
    let message = format!("invalid {}", field);
    match what {
        "batch" | "batch header" | "batch list" => CoreError::MalformedBatch(message),
        _ => CoreError::MalformedTransaction(message),
    }
}

fn decode_addresses(items: &[Value], name: &str) -> Result<Vec<Address>, CoreError> {
    items
        .iter()
        .map(|item| match item {
            Value::Text(s) => s.parse(),
            _ => Err(malformed("transaction header", name)),
        })
        .collect()
}

/// Decode a transaction header from canonical bytes.
pub fn decode_transaction_header(bytes: &[u8]) -> Result<TransactionHeader, CoreError> {
    use keys::tx_header as k;

    let value = decode_canonical(bytes, "transaction header")?;
    let fields = Fields::new(&value, "transaction header")?;

    let payload_hash: [u8; 32] = fields
        .bytes(k::PAYLOAD_HASH, "payload_hash")?
        .try_into()
        .map_err(|_| malformed("transaction header", "payload_hash"))?;

    Ok(TransactionHeader {
        version: fields.version(k::VERSION)?,
        family_name: fields.text(k::FAMILY_NAME, "family_name")?.to_owned(),
        family_version: fields.text(k::FAMILY_VERSION, "family_version")?.to_owned(),
        signer_public_key: fields.public_key(k::SIGNER, "signer")?,
        batcher_public_key: fields.public_key(k::BATCHER, "batcher")?,
        inputs: decode_addresses(fields.array(k::INPUTS, "inputs")?, "inputs")?,
        outputs: decode_addresses(fields.array(k::OUTPUTS, "outputs")?, "outputs")?,
        payload_hash: Blake3Hash(payload_hash),
    })
}

/// Decode a batch header from canonical bytes.
pub fn decode_batch_header(bytes: &[u8]) -> Result<BatchHeader, CoreError> {
    use keys::batch_header as k;

    let value = decode_canonical(bytes, "batch header")?;
    let fields = Fields::new(&value, "batch header")?;

    let transaction_ids = fields
        .array(k::TRANSACTION_IDS, "transaction_ids")?
        .iter()
        .map(|item| match item {
            Value::Bytes(b) => b
                .as_slice()
                .try_into()
                .map(TransactionId)
                .map_err(|_| malformed("batch header", "transaction id")),
            _ => Err(malformed("batch header", "transaction id")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchHeader {
        version: fields.version(k::VERSION)?,
        signer_public_key: fields.public_key(k::SIGNER, "signer")?,
        transaction_ids,
    })
}

fn decode_transaction(value: &Value) -> Result<Transaction, CoreError> {
    use keys::envelope as k;

    let fields = Fields::new(value, "transaction")?;
    Ok(Transaction {
        header: decode_transaction_header(fields.bytes(k::HEADER, "header")?)?,
        header_signature: fields.signature(k::HEADER_SIGNATURE, "header_signature")?,
        payload: Bytes::copy_from_slice(fields.bytes(k::BODY, "payload")?),
    })
}

fn decode_batch(value: &Value) -> Result<SignedBatch, CoreError> {
    use keys::envelope as k;

    let fields = Fields::new(value, "batch")?;
    let transactions = fields
        .array(k::BODY, "transactions")?
        .iter()
        .map(decode_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SignedBatch {
        header: decode_batch_header(fields.bytes(k::HEADER, "header")?)?,
        header_signature: fields.signature(k::HEADER_SIGNATURE, "header_signature")?,
        transactions,
    })
}

/// Decode a batch list from canonical bytes.
pub fn decode_batch_list(bytes: &[u8]) -> Result<BatchList, CoreError> {
    let value = decode_canonical(bytes, "batch list")?;
    let fields = Fields::new(&value, "batch list")?;

    let batches = fields
        .array(keys::batch_list::BATCHES, "batches")?
        .iter()
        .map(decode_batch)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchList { batches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressPrefix;
    use crate::crypto::{Keypair, Signer};
    use crate::transaction::TransactionBuilder;

    fn sample_header() -> TransactionHeader {
        let signer = Keypair::from_secret_bytes(&[0x42; 32]).unwrap();
        let addr = Address::derive(AddressPrefix::Ggo, &signer.public_key());
        TransactionBuilder::new("SplitGGORequest", "0.1")
            .input(addr.clone())
            .output(addr)
            .payload(b"hello".to_vec())
            .sign(signer.public_key(), &signer)
            .header
    }

    #[test]
    fn test_header_encoding_deterministic() {
        let header = sample_header();
        assert_eq!(
            transaction_header_bytes(&header),
            transaction_header_bytes(&header.clone())
        );
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let decoded = decode_transaction_header(&transaction_header_bytes(&header)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_integer_encoding() {
        let encode = |n| Cbor::Uint(n).to_vec();
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(23), vec![0x17]);
        assert_eq!(encode(24), vec![0x18, 24]);
        assert_eq!(encode(256), vec![0x19, 0x01, 0x00]);
        assert_eq!(encode(65_536), vec![0x1a, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(encode(u64::MAX), [&[0x1b][..], &[0xff; 8]].concat());
    }

    #[test]
    fn test_map_key_ordering() {
        let map = Cbor::Map(vec![
            (7, Cbor::Uint(70)),
            (0, Cbor::Uint(0)),
            (300, Cbor::text("x")),
            (5, Cbor::Uint(50)),
        ]);
        assert_eq!(
            map.to_vec(),
            vec![
                0xa4, // map(4)
                0x00, 0x00, // 0: 0
                0x05, 0x18, 50, // 5: 50
                0x07, 0x18, 70, // 7: 70
                0x19, 0x01, 0x2c, 0x61, b'x', // 300: "x"
            ]
        );
    }

    #[test]
    fn test_values_outside_wire_subset_rejected() {
        // {0: 1.5}
        let float = [0xa1, 0x00, 0xf9, 0x3e, 0x00];
        assert!(matches!(
            decode_canonical(&float, "test"),
            Err(CoreError::DecodingError(m)) if m.contains("floats")
        ));

        // {0: -1}
        let negative = [0xa1, 0x00, 0x20];
        assert!(decode_canonical(&negative, "test").is_err());

        // {"a": 0}
        let text_key = [0xa1, 0x61, b'a', 0x00];
        assert!(decode_canonical(&text_key, "test").is_err());

        // {0: true}
        let simple = [0xa1, 0x00, 0xf5];
        assert!(decode_canonical(&simple, "test").is_err());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        // {0: 0, 0: 0}
        let duplicate = [0xa2, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_canonical(&duplicate, "test"),
            Err(CoreError::DecodingError(m)) if m.contains("duplicate")
        ));
    }

    #[test]
    fn test_non_canonical_rejected() {
        // {0: 1} with the integer 1 padded to two bytes.
        let padded = [0xa1, 0x00, 0x18, 0x01];
        assert!(matches!(
            decode_canonical(&padded, "test"),
            Err(CoreError::DecodingError(_))
        ));

        // Trailing garbage after a valid header.
        let mut bytes = transaction_header_bytes(&sample_header());
        bytes.push(0x00);
        assert!(decode_transaction_header(&bytes).is_err());
    }

    #[test]
    fn test_unsorted_map_rejected() {
        // {1: 0, 0: 0}
        let unsorted = [0xa2, 0x01, 0x00, 0x00, 0x00];
        assert!(decode_canonical(&unsorted, "test").is_err());
    }

    #[test]
    fn test_missing_field_rejected() {
        let signer = Keypair::from_secret_bytes(&[0x42; 32]).unwrap();
        let header = BatchHeader {
            version: 1,
            signer_public_key: signer.public_key(),
            transaction_ids: Vec::new(),
        };
        let mut value = batch_header_value(&header);
        if let Cbor::Map(entries) = &mut value {
            entries.retain(|(k, _)| *k != keys::batch_header::SIGNER);
        }
        let bytes = value.to_vec();
        assert!(matches!(
            decode_batch_header(&bytes),
            Err(CoreError::MalformedBatch(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_batch_list(&[0xff, 0x00, 0x13]).is_err());
        assert!(decode_batch_list(&[]).is_err());
    }
}
