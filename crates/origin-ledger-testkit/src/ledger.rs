//! In-memory ledger simulator.
//!
//! [`MemoryLedger`] implements [`Transport`] and answers the same three
//! endpoints as the real REST API: batch ingress, batch statuses and state.
//! Batches are verified, then executed one at a time against a scratch copy
//! of state that is only kept if every transaction in the batch succeeds.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use thiserror::Error;

use origin_ledger_client::{
    BatchStatus, ClientError, ErrorBody, InvalidTransaction, RawResponse, StateResponse,
    StatusPage, StatusRecord, SubmitResponse, Transport,
};
use origin_ledger_core::{
    validate_batch, Address, AddressPrefix, BatchId, BatchList, Direction, Ggo, LedgerRecord,
    Measurement, PublicKey, Settlement, SettlementPart, SignedBatch, Transaction,
};
use origin_ledger_requests::{
    IssueGgoPayload, LedgerPayload, PublishMeasurementPayload, RetireGgoPayload,
    SettlementPayload, SplitGgoPayload, TransferGgoPayload,
};

/// Base URL the simulator answers on.
pub const DEFAULT_BASE_URL: &str = "http://memory-ledger";

/// Error codes returned by the ingress endpoint.
pub mod codes {
    pub const BATCHES_INVALID: i64 = 30;
    pub const NO_BATCHES: i64 = 34;
    pub const UNDECODABLE: i64 = 35;
    pub const INVALID_ID: i64 = 62;
    pub const NOT_FOUND: i64 = 75;
}

/// Why a transaction was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("payload could not be decoded: {0}")]
    Payload(String),

    #[error("address {address} is not declared as {role}")]
    Undeclared { address: Address, role: &'static str },

    #[error("signer is not authorized for {0}")]
    Unauthorized(Address),

    #[error("no state at {0}")]
    Missing(Address),

    #[error("state already exists at {0}")]
    Exists(Address),

    #[error("certificate {0} is retired")]
    Retired(Address),

    #[error("measurement {0} has the wrong direction")]
    WrongDirection(Address),

    #[error("parts sum to {actual}, expected {expected}")]
    AmountMismatch { expected: u64, actual: u64 },

    #[error("retiring {amount} exceeds the remaining {remaining} of the measurement")]
    OverRetired { amount: u64, remaining: u64 },

    #[error("certificate {0} does not match the measurement period or sector")]
    PeriodMismatch(Address),

    #[error("certificate {0} is not marked for this settlement in the batch")]
    NotMarked(Address),
}

type Outcome = std::result::Result<(), ExecutionError>;

/// Ledger state: records by address plus the set of retired certificates.
#[derive(Debug, Clone, Default)]
struct World {
    measurements: BTreeMap<Address, Measurement>,
    ggos: BTreeMap<Address, Ggo>,
    settlements: BTreeMap<Address, Settlement>,
    retired: BTreeSet<Address>,
}

/// Scratch state for one batch.
struct Execution {
    world: World,
    /// Certificates marked for retirement earlier in the batch, by settlement.
    marks: BTreeMap<Address, Address>,
}

#[derive(Default)]
struct Inner {
    world: World,
    statuses: HashMap<BatchId, StatusRecord>,
    polls: HashMap<BatchId, u32>,
    pending_polls: u32,
    rejections: VecDeque<ErrorBody>,
    failures: u32,
    head: Option<BatchId>,
    submissions: usize,
}

/// A ledger held in memory.
pub struct MemoryLedger {
    base_url: String,
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    /// Create an empty ledger answering on [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Behaviour Injection
    // ─────────────────────────────────────────────────────────────────────────

    /// Report every batch as PENDING for its first `polls` status requests.
    pub fn set_pending_polls(&self, polls: u32) {
        self.lock().pending_polls = polls;
    }

    /// Answer the next submission with an error object.
    pub fn reject_next(&self, code: i64, message: impl Into<String>, title: impl Into<String>) {
        self.lock().rejections.push_back(ErrorBody {
            code,
            message: message.into(),
            title: title.into(),
        });
    }

    /// Fail the next `count` requests below the HTTP layer.
    pub fn fail_next(&self, count: u32) {
        self.lock().failures += count;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Seeding and Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a certificate directly into state.
    pub fn insert_ggo(&self, address: Address, mut ggo: Ggo) {
        ggo.address = None;
        self.lock().world.ggos.insert(address, ggo);
    }

    /// Write a measurement directly into state.
    pub fn insert_measurement(&self, address: Address, mut measurement: Measurement) {
        measurement.address = None;
        self.lock().world.measurements.insert(address, measurement);
    }

    pub fn measurement(&self, address: &Address) -> Option<Measurement> {
        self.lock().world.measurements.get(address).cloned()
    }

    pub fn ggo(&self, address: &Address) -> Option<Ggo> {
        self.lock().world.ggos.get(address).cloned()
    }

    pub fn settlement(&self, address: &Address) -> Option<Settlement> {
        self.lock().world.settlements.get(address).cloned()
    }

    pub fn is_retired(&self, address: &Address) -> bool {
        self.lock().world.retired.contains(address)
    }

    /// Final status of a batch, if it was accepted.
    pub fn status(&self, id: &BatchId) -> Option<StatusRecord> {
        self.lock().statuses.get(id).cloned()
    }

    /// Submissions accepted at the ingress endpoint.
    pub fn submissions(&self) -> usize {
        self.lock().submissions
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    fn take_failure(&self) -> Result<(), ClientError> {
        let mut inner = self.lock();
        if inner.failures > 0 {
            inner.failures -= 1;
            return Err(ClientError::Transport("simulated connection failure".into()));
        }
        Ok(())
    }

    fn submit_batches(&self, body: &[u8]) -> Result<RawResponse, ClientError> {
        let mut inner = self.lock();

        if let Some(error) = inner.rejections.pop_front() {
            return RawResponse::json(400, &SubmitResponse { link: None, error: Some(error) });
        }

        let list = match BatchList::from_bytes(body) {
            Ok(list) => list,
            Err(e) => {
                return error_response(400, codes::UNDECODABLE, "Batch List Not Decodable", e.to_string())
            }
        };
        if list.batches.is_empty() {
            return error_response(400, codes::NO_BATCHES, "No Batches Submitted", "batch list is empty");
        }
        for batch in &list.batches {
            if let Err(e) = validate_batch(batch) {
                tracing::debug!(batch = ?batch.id(), error = %e, "rejecting unverifiable batch");
                return error_response(400, codes::BATCHES_INVALID, "Submitted Batches Invalid", e.to_string());
            }
        }

        inner.submissions += 1;
        let ids = list.ids();
        for batch in &list.batches {
            if inner.statuses.contains_key(&batch.id()) {
                continue;
            }
            let record = inner.execute(batch);
            inner.statuses.insert(record.id, record);
        }

        let link = format!(
            "{}/batch_statuses?id={}",
            self.base_url,
            ids.iter().map(|id| id.to_hex()).collect::<Vec<_>>().join(",")
        );
        RawResponse::json(202, &SubmitResponse { link: Some(link), error: None })
    }

    fn batch_statuses(&self, url: &str, query: &str) -> Result<RawResponse, ClientError> {
        let mut ids = Vec::new();
        for hex in query.split(',').filter(|s| !s.is_empty()) {
            match BatchId::from_hex(hex) {
                Ok(id) => ids.push(id),
                Err(e) => return error_response(400, codes::INVALID_ID, "Invalid Resource Id", e.to_string()),
            }
        }

        let mut inner = self.lock();
        let pending_polls = inner.pending_polls;
        let mut data = Vec::with_capacity(ids.len());
        for id in ids {
            let polls = inner.polls.entry(id).or_insert(0);
            *polls += 1;
            let polled = *polls;

            let record = match inner.statuses.get(&id) {
                None => StatusRecord::unknown(id),
                Some(_) if polled <= pending_polls => StatusRecord {
                    id,
                    status: BatchStatus::Pending,
                    invalid_transactions: Vec::new(),
                },
                Some(record) => record.clone(),
            };
            data.push(record);
        }

        RawResponse::json(
            200,
            &StatusPage {
                data,
                link: Some(url.to_owned()),
            },
        )
    }

    fn state(&self, url: &str, address: &str) -> Result<RawResponse, ClientError> {
        let address: Address = match address.parse() {
            Ok(address) => address,
            Err(e) => return error_response(400, codes::INVALID_ID, "Invalid State Address", format!("{}", e)),
        };

        let inner = self.lock();
        let bytes = match address.prefix() {
            AddressPrefix::Measurement => inner.world.measurements.get(&address).map(LedgerRecord::to_bytes),
            AddressPrefix::Ggo => inner.world.ggos.get(&address).map(LedgerRecord::to_bytes),
            AddressPrefix::Settlement => inner.world.settlements.get(&address).map(LedgerRecord::to_bytes),
        };

        match bytes {
            None => error_response(
                404,
                codes::NOT_FOUND,
                "State Not Found",
                format!("there is no state at {}", address),
            ),
            Some(Err(e)) => error_response(500, 10, "Unknown Validator Error", e.to_string()),
            Some(Ok(bytes)) => RawResponse::json(
                200,
                &StateResponse {
                    data: BASE64.encode(bytes),
                    head: inner.head.map(|id| id.to_hex()),
                    link: Some(url.to_owned()),
                },
            ),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryLedger")
            .field("base_url", &self.base_url)
            .field("measurements", &inner.world.measurements.len())
            .field("ggos", &inner.world.ggos.len())
            .field("settlements", &inner.world.settlements.len())
            .field("batches", &inner.statuses.len())
            .finish()
    }
}

#[async_trait]
impl Transport for MemoryLedger {
    async fn post(&self, url: &str, _content_type: &str, body: Bytes) -> Result<RawResponse, ClientError> {
        self.take_failure()?;
        if url == format!("{}/batches", self.base_url) {
            self.submit_batches(&body)
        } else {
            error_response(404, codes::NOT_FOUND, "Not Found", url)
        }
    }

    async fn get(&self, url: &str) -> Result<RawResponse, ClientError> {
        self.take_failure()?;
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or_default();
        if let Some(query) = path.strip_prefix("/batch_statuses?id=") {
            self.batch_statuses(url, query)
        } else if let Some(address) = path.strip_prefix("/state/") {
            self.state(url, address)
        } else {
            error_response(404, codes::NOT_FOUND, "Not Found", url)
        }
    }
}

fn error_response(
    status: u16,
    code: i64,
    title: &str,
    message: impl Into<String>,
) -> Result<RawResponse, ClientError> {
    RawResponse::json(
        status,
        &SubmitResponse {
            link: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
                title: title.to_owned(),
            }),
        },
    )
}

impl Inner {
    /// Execute a verified batch atomically.
    fn execute(&mut self, batch: &SignedBatch) -> StatusRecord {
        let mut execution = Execution {
            world: self.world.clone(),
            marks: BTreeMap::new(),
        };

        for tx in &batch.transactions {
            if let Err(e) = execution.apply(tx) {
                tracing::debug!(batch = ?batch.id(), tx = ?tx.id(), error = %e, "batch invalid");
                return StatusRecord {
                    id: batch.id(),
                    status: BatchStatus::Invalid,
                    invalid_transactions: vec![InvalidTransaction {
                        id: tx.id(),
                        message: e.to_string(),
                    }],
                };
            }
        }

        tracing::debug!(batch = ?batch.id(), transactions = batch.len(), "batch committed");
        self.world = execution.world;
        self.head = Some(batch.id());
        StatusRecord {
            id: batch.id(),
            status: BatchStatus::Committed,
            invalid_transactions: Vec::new(),
        }
    }
}

impl Execution {
    fn apply(&mut self, tx: &Transaction) -> Outcome {
        let payload = LedgerPayload::decode(tx.family_name(), &tx.payload)
            .map_err(|e| ExecutionError::Payload(e.to_string()))?;
        let signer = tx.signer();

        match payload {
            LedgerPayload::PublishMeasurement(p) => self.publish(tx, signer, p),
            LedgerPayload::IssueGgo(p) => self.issue(tx, signer, p),
            LedgerPayload::SplitGgo(p) => self.split(tx, signer, p),
            LedgerPayload::TransferGgo(p) => self.transfer(tx, signer, p),
            LedgerPayload::RetireGgo(p) => self.retire(tx, signer, p),
            LedgerPayload::Settlement(p) => self.settle(tx, signer, p),
        }
    }

    fn publish(&mut self, tx: &Transaction, signer: &PublicKey, p: PublishMeasurementPayload) -> Outcome {
        let address = owned(signer, AddressPrefix::Measurement);
        declared(tx.inputs(), &address, "input")?;
        declared(tx.outputs(), &address, "output")?;
        if p.key != *signer {
            return Err(ExecutionError::Unauthorized(address));
        }
        if self.world.measurements.contains_key(&address) {
            return Err(ExecutionError::Exists(address));
        }

        self.world.measurements.insert(
            address,
            Measurement {
                address: None,
                amount: p.amount,
                begin: p.begin,
                end: p.end,
                sector: p.sector,
                direction: p.direction,
                key: p.key,
            },
        );
        Ok(())
    }

    fn issue(&mut self, tx: &Transaction, signer: &PublicKey, p: IssueGgoPayload) -> Outcome {
        authorize(signer, AddressPrefix::Measurement, &p.origin)?;
        declared(tx.inputs(), &p.origin, "input")?;

        let address = owned(signer, AddressPrefix::Ggo);
        declared(tx.outputs(), &address, "output")?;
        if self.world.ggos.contains_key(&address) {
            return Err(ExecutionError::Exists(address));
        }

        let measurement = self
            .world
            .measurements
            .get(&p.origin)
            .ok_or_else(|| ExecutionError::Missing(p.origin.clone()))?;
        if measurement.direction != Direction::Production {
            return Err(ExecutionError::WrongDirection(p.origin));
        }

        let ggo = Ggo {
            address: None,
            amount: measurement.amount,
            begin: measurement.begin,
            end: measurement.end,
            sector: measurement.sector.clone(),
            tech_type: p.tech_type,
            fuel_type: p.fuel_type,
            key: p.key,
        };
        self.world.ggos.insert(address, ggo);
        Ok(())
    }

    /// The live certificate at `address`, owned by `signer`.
    fn spendable(&self, signer: &PublicKey, address: &Address) -> Result<&Ggo, ExecutionError> {
        authorize(signer, AddressPrefix::Ggo, address)?;
        if self.world.retired.contains(address) {
            return Err(ExecutionError::Retired(address.clone()));
        }
        self.world
            .ggos
            .get(address)
            .ok_or_else(|| ExecutionError::Missing(address.clone()))
    }

    fn split(&mut self, tx: &Transaction, signer: &PublicKey, p: SplitGgoPayload) -> Outcome {
        declared(tx.inputs(), &p.origin, "input")?;
        let source = self.spendable(signer, &p.origin)?.clone();

        let actual: u64 = p.parts.iter().map(|part| part.amount).sum();
        if p.parts.is_empty() || actual != source.amount {
            return Err(ExecutionError::AmountMismatch {
                expected: source.amount,
                actual,
            });
        }
        for part in &p.parts {
            declared(tx.outputs(), &part.address, "output")?;
            if part.address != p.origin && self.world.ggos.contains_key(&part.address) {
                return Err(ExecutionError::Exists(part.address.clone()));
            }
        }

        self.world.ggos.remove(&p.origin);
        for part in p.parts {
            let ggo = Ggo {
                amount: part.amount,
                ..source.clone()
            };
            self.world.ggos.insert(part.address, ggo);
        }
        Ok(())
    }

    fn transfer(&mut self, tx: &Transaction, signer: &PublicKey, p: TransferGgoPayload) -> Outcome {
        declared(tx.inputs(), &p.origin, "input")?;
        declared(tx.outputs(), &p.destination, "output")?;
        let ggo = self.spendable(signer, &p.origin)?.clone();
        if self.world.ggos.contains_key(&p.destination) {
            return Err(ExecutionError::Exists(p.destination));
        }

        self.world.ggos.remove(&p.origin);
        self.world.ggos.insert(p.destination, ggo);
        Ok(())
    }

    fn retire(&mut self, tx: &Transaction, signer: &PublicKey, p: RetireGgoPayload) -> Outcome {
        declared(tx.inputs(), &p.origin, "input")?;
        declared(tx.outputs(), &p.origin, "output")?;
        self.spendable(signer, &p.origin)?;
        if self.marks.contains_key(&p.origin) {
            return Err(ExecutionError::Retired(p.origin));
        }

        self.marks.insert(p.origin, p.settlement_address);
        Ok(())
    }

    fn settle(&mut self, tx: &Transaction, signer: &PublicKey, p: SettlementPayload) -> Outcome {
        authorize(signer, AddressPrefix::Measurement, &p.measurement_address)?;
        authorize(signer, AddressPrefix::Settlement, &p.settlement_address)?;
        declared(tx.inputs(), &p.settlement_address, "input")?;
        declared(tx.inputs(), &p.measurement_address, "input")?;
        declared(tx.outputs(), &p.settlement_address, "output")?;

        let measurement = self
            .world
            .measurements
            .get(&p.measurement_address)
            .ok_or_else(|| ExecutionError::Missing(p.measurement_address.clone()))?;
        if measurement.direction != Direction::Consumption {
            return Err(ExecutionError::WrongDirection(p.measurement_address));
        }

        let mut parts = Vec::with_capacity(p.ggo_addresses.len());
        for address in &p.ggo_addresses {
            declared(tx.inputs(), address, "input")?;
            if self.marks.get(address) != Some(&p.settlement_address) {
                return Err(ExecutionError::NotMarked(address.clone()));
            }
            let ggo = self
                .world
                .ggos
                .get(address)
                .ok_or_else(|| ExecutionError::Missing(address.clone()))?;
            if ggo.begin != measurement.begin || ggo.sector != measurement.sector {
                return Err(ExecutionError::PeriodMismatch(address.clone()));
            }
            parts.push(SettlementPart {
                ggo_address: address.clone(),
                amount: ggo.amount,
            });
        }

        let mut settlement = self
            .world
            .settlements
            .get(&p.settlement_address)
            .cloned()
            .unwrap_or_else(|| Settlement {
                address: None,
                measurement_address: p.measurement_address.clone(),
                parts: Vec::new(),
            });

        let remaining = measurement.amount.saturating_sub(settlement.retired_amount());
        let amount: u64 = parts.iter().map(|part| part.amount).sum();
        if amount > remaining {
            return Err(ExecutionError::OverRetired { amount, remaining });
        }

        for address in &p.ggo_addresses {
            self.marks.remove(address);
            self.world.retired.insert(address.clone());
        }
        settlement.parts.extend(parts);
        self.world.settlements.insert(p.settlement_address, settlement);
        Ok(())
    }
}

fn owned(signer: &PublicKey, prefix: AddressPrefix) -> Address {
    Address::derive(prefix, signer)
}

/// The signer owns `address` if it derives from the signer's key.
fn authorize(signer: &PublicKey, prefix: AddressPrefix, address: &Address) -> Outcome {
    if owned(signer, prefix) == *address {
        Ok(())
    } else {
        Err(ExecutionError::Unauthorized(address.clone()))
    }
}

fn declared(list: &[Address], address: &Address, role: &'static str) -> Outcome {
    if list.contains(address) {
        Ok(())
    } else {
        Err(ExecutionError::Undeclared {
            address: address.clone(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{begin, end, TestParty, SECTOR};
    use origin_ledger_client::OCTET_STREAM;
    use origin_ledger_core::{Signer, TransactionBuilder};
    use origin_ledger_requests::{Compile, SplitGgo, SplitPart, TransferGgo, FAMILY_VERSION};

    fn party() -> TestParty {
        TestParty::new(b"memory ledger tests")
    }

    async fn submit(ledger: &MemoryLedger, batch: &SignedBatch) -> RawResponse {
        let body = BatchList::new(vec![batch.clone()]).to_bytes();
        ledger
            .post(&format!("{}/batches", ledger.base_url()), OCTET_STREAM, body.into())
            .await
            .unwrap()
    }

    fn seed_ggo(ledger: &MemoryLedger, party: &TestParty, index: u32, amount: u64) -> Address {
        let key = party.ggo_key(index);
        let address = party.ggo_address(index);
        ledger.insert_ggo(
            address.clone(),
            Ggo {
                address: None,
                amount,
                begin: begin(0),
                end: end(0),
                sector: SECTOR.into(),
                tech_type: "T".into(),
                fuel_type: "F".into(),
                key: key.public_key(),
            },
        );
        address
    }

    #[tokio::test]
    async fn test_publish_and_issue_commit() {
        let ledger = MemoryLedger::new();
        let party = party();
        let batch = party
            .batch()
            .with(party.publish(0, 500, Direction::Production))
            .with(party.issue(0))
            .build()
            .unwrap();

        let response = submit(&ledger, &batch).await;
        assert_eq!(response.status, 202);
        assert_eq!(ledger.status(&batch.id()).unwrap().status, BatchStatus::Committed);

        let ggo = ledger.ggo(&party.issued_ggo_address(0)).unwrap();
        assert_eq!(ggo.amount, 500);
        assert_eq!(ggo.sector, SECTOR);
    }

    #[tokio::test]
    async fn test_publish_must_declare_measurement_read() {
        let ledger = MemoryLedger::new();
        let party = party();
        let account = party.account();
        let meter = party.meter(0).keypair().unwrap();

        let compiled = party
            .publish(0, 500, Direction::Production)
            .compile(&account.public_key())
            .unwrap()
            .remove(0);
        let write_only = TransactionBuilder::new(compiled.family_name(), FAMILY_VERSION)
            .outputs(compiled.outputs().to_vec())
            .payload(compiled.payload.clone())
            .sign(account.public_key(), &meter);
        let batch = SignedBatch::sign(vec![write_only], &account);

        submit(&ledger, &batch).await;
        let status = ledger.status(&batch.id()).unwrap();
        assert_eq!(status.status, BatchStatus::Invalid);
        assert!(status.invalid_transactions[0].message.contains("input"));
        assert!(ledger.measurement(&party.measurement_address(0)).is_none());
    }

    #[tokio::test]
    async fn test_invalid_batch_leaves_state_untouched() {
        let ledger = MemoryLedger::new();
        let party = party();
        // Issuing against a consumption measurement fails after the publish.
        let batch = party
            .batch()
            .with(party.publish(0, 500, Direction::Consumption))
            .with(party.issue(0))
            .build()
            .unwrap();

        submit(&ledger, &batch).await;
        let status = ledger.status(&batch.id()).unwrap();
        assert_eq!(status.status, BatchStatus::Invalid);
        assert_eq!(status.invalid_transactions[0].id, batch.transactions[1].id());
        assert!(ledger.measurement(&party.measurement_address(0)).is_none());
    }

    #[tokio::test]
    async fn test_split_must_conserve_amount() {
        let ledger = MemoryLedger::new();
        let party = party();
        seed_ggo(&ledger, &party, 0, 100);

        let parts = vec![
            SplitPart::new(party.ggo_address(1), 60),
            SplitPart::new(party.ggo_address(2), 30),
        ];
        let batch = party
            .batch()
            .with(SplitGgo::new(party.ggo_key(0), parts))
            .build()
            .unwrap();

        submit(&ledger, &batch).await;
        let status = ledger.status(&batch.id()).unwrap();
        assert_eq!(status.status, BatchStatus::Invalid);
        assert!(status.invalid_transactions[0].message.contains("expected 100"));
        assert!(ledger.ggo(&party.ggo_address(0)).is_some());
    }

    #[tokio::test]
    async fn test_transfer_requires_ownership() {
        let ledger = MemoryLedger::new();
        let party = party();
        seed_ggo(&ledger, &party, 0, 100);

        // Key 1 does not own the certificate at key 0's address.
        let mut transfer = TransferGgo::new(party.ggo_key(1), party.ggo_address(2));
        transfer.origin = party.ggo_address(0);
        let batch = party.batch().with(transfer).build().unwrap();

        submit(&ledger, &batch).await;
        let status = ledger.status(&batch.id()).unwrap();
        assert_eq!(status.status, BatchStatus::Invalid);
        assert!(status.invalid_transactions[0].message.contains("not authorized"));
    }

    #[tokio::test]
    async fn test_tampered_batch_rejected_at_ingress() {
        let ledger = MemoryLedger::new();
        let party = party();
        let mut batch = party
            .batch()
            .with(party.publish(0, 500, Direction::Production))
            .build()
            .unwrap();
        batch.transactions[0].payload = Bytes::from_static(b"tampered");

        let response = submit(&ledger, &batch).await;
        assert_eq!(response.status, 400);
        let body: SubmitResponse = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.error.unwrap().code, codes::BATCHES_INVALID);
        assert_eq!(ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_body_rejected() {
        let ledger = MemoryLedger::new();
        let response = ledger
            .post(
                &format!("{}/batches", DEFAULT_BASE_URL),
                OCTET_STREAM,
                Bytes::from_static(b"\xff\x00"),
            )
            .await
            .unwrap();
        let body: SubmitResponse = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.error.unwrap().code, codes::UNDECODABLE);
    }

    #[tokio::test]
    async fn test_pending_polls_then_final_status() {
        let ledger = MemoryLedger::new();
        ledger.set_pending_polls(2);
        let party = party();
        let batch = party
            .batch()
            .with(party.publish(0, 1, Direction::Production))
            .build()
            .unwrap();

        let response = submit(&ledger, &batch).await;
        let link = serde_json::from_slice::<SubmitResponse>(&response.body)
            .unwrap()
            .link
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let page: StatusPage =
                serde_json::from_slice(&ledger.get(&link).await.unwrap().body).unwrap();
            seen.push(page.data[0].status);
        }
        assert_eq!(
            seen,
            vec![BatchStatus::Pending, BatchStatus::Pending, BatchStatus::Committed]
        );
    }

    #[tokio::test]
    async fn test_unknown_batch_and_missing_state() {
        let ledger = MemoryLedger::new();
        let id = BatchId::from_bytes([0x0f; 64]);
        let url = format!("{}/batch_statuses?id={}", DEFAULT_BASE_URL, id.to_hex());
        let page: StatusPage =
            serde_json::from_slice(&ledger.get(&url).await.unwrap().body).unwrap();
        assert_eq!(page.data, vec![StatusRecord::unknown(id)]);

        let address = party().ggo_address(0);
        let response = ledger
            .get(&format!("{}/state/{}", DEFAULT_BASE_URL, address))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let ledger = MemoryLedger::new();
        ledger.fail_next(1);
        ledger.reject_next(30, "nope", "Submitted Batches Invalid");

        let url = format!("{}/batches", DEFAULT_BASE_URL);
        assert!(matches!(
            ledger.post(&url, OCTET_STREAM, Bytes::new()).await,
            Err(ClientError::Transport(_))
        ));
        let response = ledger.post(&url, OCTET_STREAM, Bytes::new()).await.unwrap();
        let body: SubmitResponse = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.error.unwrap().message, "nope");
    }
}
