//! Requests: high-level intents that compile into signed transactions.
//!
//! Every request carries the addresses it touches and the key handles that
//! authorize it. Compilation is pure and deterministic: the same request
//! compiled against the same batcher yields identical transactions.

mod issue;
mod publish;
mod retire;
mod split;
mod transfer;

pub use issue::IssueGgo;
pub use publish::PublishMeasurement;
pub use retire::{RetireGgo, RetirePart};
pub use split::{SplitGgo, SplitPart};
pub use transfer::TransferGgo;

use origin_ledger_core::{
    Address, ExtendedKey, KeyError, Keypair, PublicKey, Transaction, TransactionBuilder,
};

use crate::error::{RequestError, Result};
use crate::payload::{Payload, FAMILY_VERSION};

/// Compiles a request into the transactions that carry it out.
pub trait Compile {
    /// Compile into signed transactions naming `batcher` as the batch signer.
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>>;
}

/// The closed set of requests a batch can carry.
#[derive(Debug, Clone)]
pub enum Request {
    PublishMeasurement(PublishMeasurement),
    IssueGgo(IssueGgo),
    SplitGgo(SplitGgo),
    TransferGgo(TransferGgo),
    RetireGgo(RetireGgo),
}

impl Compile for Request {
    fn compile(&self, batcher: &PublicKey) -> Result<Vec<Transaction>> {
        match self {
            Self::PublishMeasurement(r) => r.compile(batcher),
            Self::IssueGgo(r) => r.compile(batcher),
            Self::SplitGgo(r) => r.compile(batcher),
            Self::TransferGgo(r) => r.compile(batcher),
            Self::RetireGgo(r) => r.compile(batcher),
        }
    }
}

macro_rules! into_request {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Request {
                fn from(request: $variant) -> Self {
                    Self::$variant(request)
                }
            }
        )*
    };
}

into_request!(PublishMeasurement, IssueGgo, SplitGgo, TransferGgo, RetireGgo);

/// Bind a key handle to a signer, naming its role if it cannot sign.
pub(crate) fn signing_key(key: &ExtendedKey, role: &'static str) -> Result<Keypair> {
    key.keypair().map_err(|e| match e {
        KeyError::MissingPrivateKey => RequestError::MissingKeyMaterial { role },
        other => RequestError::Key(other),
    })
}

/// Build and sign one transaction carrying `payload`.
fn sign_transaction<P: Payload>(
    payload: &P,
    signer: &Keypair,
    batcher: &PublicKey,
    inputs: Vec<Address>,
    outputs: Vec<Address>,
) -> Result<Transaction> {
    Ok(TransactionBuilder::new(P::FAMILY.name(), FAMILY_VERSION)
        .inputs(inputs)
        .outputs(outputs)
        .payload(payload.to_bytes()?)
        .sign(*batcher, signer))
}
