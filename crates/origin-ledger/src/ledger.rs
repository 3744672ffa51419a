//! The Ledger: one entry point for building, submitting and tracking batches.

use origin_ledger_client::{
    ClientConfig, Handle, HttpTransport, LedgerClient, PollPolicy, StatusRecord, Transport,
};
use origin_ledger_core::{Address, Ggo, Measurement, ResolvedRecord, Settlement, SignedBatch, Signer};
use origin_ledger_requests::BatchBuilder;

use crate::error::Result;

/// Configuration for the Ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Endpoint and HTTP settings.
    pub client: ClientConfig,
    /// Polling policy used by [`Ledger::wait_for_commit`].
    pub poll: PollPolicy,
}

impl LedgerConfig {
    /// Configuration for the ledger at `base_url`, other fields default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ClientConfig::new(base_url),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// A connection to one ledger.
pub struct Ledger<T = HttpTransport> {
    client: LedgerClient<T>,
    poll: PollPolicy,
}

impl Ledger<HttpTransport> {
    /// Connect over HTTP to the ledger at `base_url` with default settings.
    pub fn connect(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(LedgerConfig::new(base_url))
    }

    /// Connect over HTTP with explicit settings.
    pub fn with_config(config: LedgerConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.client)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Ledger<T> {
    /// Create a ledger over any transport.
    pub fn new(transport: T, config: LedgerConfig) -> Self {
        Self {
            client: LedgerClient::new(transport, config.client),
            poll: config.poll,
        }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &LedgerClient<T> {
        &self.client
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Batch Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Build, sign and submit the builder's batch.
    ///
    /// Nothing is sent if any request fails to compile.
    pub async fn execute_batch<S: Signer>(&self, builder: &BatchBuilder<S>) -> Result<Handle> {
        let batch = builder.build()?;
        tracing::debug!(
            batch = ?batch.id(),
            transactions = batch.len(),
            "executing batch"
        );
        self.submit(&batch).await
    }

    /// Submit an already signed batch.
    pub async fn submit(&self, batch: &SignedBatch) -> Result<Handle> {
        Ok(self.client.submit(batch).await?)
    }

    /// Current status of the handle's batch. Polls once.
    pub async fn get_batch_status(&self, handle: &Handle) -> Result<StatusRecord> {
        Ok(self.client.poll_status(handle).await?)
    }

    /// Poll with the configured policy until the batch commits.
    pub async fn wait_for_commit(&self, handle: &Handle) -> Result<StatusRecord> {
        Ok(self.client.wait_for_commit(handle, self.poll).await?)
    }

    /// Execute a batch and wait for it to commit.
    pub async fn execute_and_wait<S: Signer>(
        &self,
        builder: &BatchBuilder<S>,
    ) -> Result<StatusRecord> {
        let handle = self.execute_batch(builder).await?;
        self.wait_for_commit(&handle).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the record at an address, typed by the address prefix.
    pub async fn resolve(&self, address: &Address) -> Result<ResolvedRecord> {
        Ok(self.client.resolve(address).await?)
    }

    pub async fn get_measurement(&self, address: &Address) -> Result<Measurement> {
        Ok(self.client.get_measurement(address).await?)
    }

    pub async fn get_ggo(&self, address: &Address) -> Result<Ggo> {
        Ok(self.client.get_ggo(address).await?)
    }

    pub async fn get_settlement(&self, address: &Address) -> Result<Settlement> {
        Ok(self.client.get_settlement(address).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use chrono::{TimeZone, Utc};
    use origin_ledger_client::{BatchStatus, ClientError, ScriptedTransport};
    use origin_ledger_core::{AddressPrefix, BatchList, Direction, ExtendedKey, KeyError};
    use origin_ledger_requests::{IssueGgo, PublishMeasurement, RequestError, TransferGgo};
    use serde_json::json;
    use std::time::Duration;

    fn ledger() -> Ledger<ScriptedTransport> {
        let config = LedgerConfig::new("http://ledger")
            .with_poll(PollPolicy::fixed(Duration::from_millis(1), 5));
        Ledger::new(ScriptedTransport::new(), config)
    }

    fn meter() -> ExtendedKey {
        ExtendedKey::from_entropy(b"ledger facade tests")
            .unwrap()
            .derive(0)
            .unwrap()
    }

    fn builder() -> BatchBuilder {
        let meter = meter();
        let begin = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 13, 0, 0).unwrap();
        BatchBuilder::from_key(&meter)
            .unwrap()
            .with(PublishMeasurement::new(
                meter.clone(),
                1244,
                begin,
                end,
                "DK1",
                Direction::Production,
            ))
            .with(IssueGgo::new(meter, "T12412", "F123123"))
    }

    #[tokio::test]
    async fn test_execute_and_wait() -> anyhow::Result<()> {
        let ledger = ledger();
        let batch = builder().build()?;
        let status = |s: &str| json!({"data": [{"id": batch.id(), "status": s}]});

        let transport = ledger.client().transport();
        transport
            .respond_json(202, &json!({"link": "http://ledger/batch_statuses?id=1"}))
            .await;
        transport.respond_json(200, &status("PENDING")).await;
        transport.respond_json(200, &status("COMMITTED")).await;

        let record = ledger.execute_and_wait(&builder()).await?;
        assert_eq!(record.id, batch.id());
        assert_eq!(record.status, BatchStatus::Committed);

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 3);
        let sent = BatchList::from_bytes(&requests[0].body)?;
        assert_eq!(sent.batches, vec![batch]);
        Ok(())
    }

    #[tokio::test]
    async fn test_compile_failure_sends_nothing() {
        let ledger = ledger();
        let public_only = meter().neuter();
        let destination = Address::derive(AddressPrefix::Ggo, &meter().derive(1).unwrap().public_key());
        let builder = BatchBuilder::from_key(&meter())
            .unwrap()
            .with(TransferGgo::new(public_only, destination));

        let result = ledger.execute_batch(&builder).await;
        assert!(matches!(
            result,
            Err(LedgerError::Request(RequestError::MissingKeyMaterial { .. }))
        ));
        assert!(ledger.client().transport().requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_batch_status_single_poll() {
        let ledger = ledger();
        let batch = builder().build().unwrap();
        let handle = Handle::new("http://ledger/batch_statuses?id=1", vec![batch.id()]);
        ledger
            .client()
            .transport()
            .respond_json(200, &json!({"data": [{"id": batch.id(), "status": "PENDING"}]}))
            .await;

        let record = ledger.get_batch_status(&handle).await.unwrap();
        assert_eq!(record.status, BatchStatus::Pending);
        assert_eq!(ledger.client().transport().requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_reports_invalid_batch() {
        let ledger = ledger();
        let batch = builder().build().unwrap();
        let handle = Handle::new("http://ledger/batch_statuses?id=1", vec![batch.id()]);
        ledger
            .client()
            .transport()
            .respond_json(
                200,
                &json!({"data": [{"id": batch.id(), "status": "INVALID", "invalid_transactions": []}]}),
            )
            .await;

        let err = ledger.wait_for_commit(&handle).await.unwrap_err();
        assert!(err.is_batch_invalid());
    }

    #[tokio::test]
    async fn test_lookup_missing_state() {
        let ledger = ledger();
        ledger
            .client()
            .transport()
            .respond_json(404, &json!({"error": {"code": 75, "message": "", "title": "State Not Found"}}))
            .await;

        let address = meter().address(AddressPrefix::Ggo);
        assert!(matches!(
            ledger.get_ggo(&address).await,
            Err(LedgerError::Client(ClientError::NotFound(_)))
        ));
    }

    #[test]
    fn test_key_errors_convert() {
        let err: LedgerError = KeyError::MissingPrivateKey.into();
        assert!(matches!(err, LedgerError::Key(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_connect_builds_http_ledger() {
        let ledger = Ledger::connect("http://localhost:8008").unwrap();
        assert_eq!(ledger.poll_policy(), PollPolicy::default());
        assert_eq!(
            ledger.client().config().batches_url(),
            "http://localhost:8008/batches"
        );
    }
}
