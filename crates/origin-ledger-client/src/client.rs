//! The ledger client: submission, status polls and state reads.
//!
//! Every operation is a single exchange with the ledger. Nothing here loops,
//! sleeps or retries; see [`crate::tracker`] for driving a batch to a
//! terminal status.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use origin_ledger_core::{
    Address, BatchList, CoreError, Ggo, LedgerRecord, Measurement, ResolvedRecord, Settlement,
    SignedBatch,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::messages::{Handle, StateResponse, StatusPage, StatusRecord, SubmitResponse};
use crate::tracker::{BatchTracker, PollPolicy};
use crate::transport::{RawResponse, Transport, OCTET_STREAM};

/// Client for one ledger endpoint.
#[derive(Debug, Clone)]
pub struct LedgerClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> LedgerClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit one signed batch.
    pub async fn submit(&self, batch: &SignedBatch) -> Result<Handle> {
        self.submit_all(std::slice::from_ref(batch)).await
    }

    /// Submit several batches in one batch list.
    pub async fn submit_all(&self, batches: &[SignedBatch]) -> Result<Handle> {
        let list = BatchList::new(batches.to_vec());
        let batch_ids = list.ids();
        let body = Bytes::from(list.to_bytes());

        tracing::debug!(
            batches = batches.len(),
            bytes = body.len(),
            "submitting batch list"
        );

        let response = self
            .transport
            .post(&self.config.batches_url(), OCTET_STREAM, body)
            .await?;
        let parsed: SubmitResponse = decode_json(&response)?;

        if let Some(error) = parsed.error {
            tracing::warn!(
                code = error.code,
                title = %error.title,
                "ledger rejected batch submission: {}",
                error.message
            );
            return Err(ClientError::LedgerRejected {
                code: error.code,
                message: error.message,
                title: error.title,
            });
        }

        match parsed.link {
            Some(link) if response.is_success() => Ok(Handle { link, batch_ids }),
            _ => Err(ClientError::ResponseDecode(format!(
                "submission answered with status {} and no link",
                response.status
            ))),
        }
    }

    /// Fetch the status page behind a handle.
    ///
    /// Batches the ledger does not report on come back as UNKNOWN.
    pub async fn poll_statuses(&self, handle: &Handle) -> Result<Vec<StatusRecord>> {
        let response = self.transport.get(&handle.link).await?;
        if !response.is_success() {
            return Err(ClientError::ResponseDecode(format!(
                "status request answered with status {}",
                response.status
            )));
        }
        let page: StatusPage = decode_json(&response)?;

        let mut records = page.data;
        for id in &handle.batch_ids {
            if !records.iter().any(|r| &r.id == id) {
                records.push(StatusRecord::unknown(*id));
            }
        }
        Ok(records)
    }

    /// Fetch the status of the handle's first batch.
    pub async fn poll_status(&self, handle: &Handle) -> Result<StatusRecord> {
        let records = self.poll_statuses(handle).await?;

        let record = match handle.batch_ids.first() {
            Some(id) => records.into_iter().find(|r| &r.id == id),
            None => records.into_iter().next(),
        };
        let record = record
            .ok_or_else(|| ClientError::ResponseDecode("status page is empty".into()))?;

        tracing::debug!(batch = ?record.id, status = %record.status, "polled batch status");
        Ok(record)
    }

    /// Poll until the handle's first batch commits, per `policy`.
    pub async fn wait_for_commit(&self, handle: &Handle, policy: PollPolicy) -> Result<StatusRecord> {
        BatchTracker::new(self, handle.clone(), policy).wait().await
    }

    /// Read the raw record bytes stored at an address.
    pub async fn read_state(&self, address: &Address) -> Result<Vec<u8>> {
        let response = self.transport.get(&self.config.state_url(address)).await?;
        if response.status == 404 {
            return Err(ClientError::NotFound(address.to_string()));
        }
        if !response.is_success() {
            return Err(ClientError::ResponseDecode(format!(
                "state request answered with status {}",
                response.status
            )));
        }

        let state: StateResponse = decode_json(&response)?;
        let bytes = BASE64
            .decode(state.data.as_bytes())
            .map_err(|e| ClientError::ResponseDecode(format!("state data is not base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ClientError::NotFound(address.to_string()));
        }
        Ok(bytes)
    }

    /// Read and decode the record at an address, by its prefix.
    pub async fn resolve(&self, address: &Address) -> Result<ResolvedRecord> {
        let bytes = self.read_state(address).await?;
        ResolvedRecord::decode(address, &bytes).map_err(|e| ClientError::ResponseDecode(e.to_string()))
    }

    /// Read a record of a known type.
    pub async fn get_record<R: LedgerRecord>(&self, address: &Address) -> Result<R> {
        if address.prefix() != R::PREFIX {
            return Err(ClientError::Core(CoreError::InvalidAddress(format!(
                "expected a {} address, got a {} address",
                R::PREFIX,
                address.prefix()
            ))));
        }

        let bytes = self.read_state(address).await?;
        let mut record =
            R::from_bytes(&bytes).map_err(|e| ClientError::ResponseDecode(e.to_string()))?;
        record.stamp(address.clone());
        Ok(record)
    }

    pub async fn get_measurement(&self, address: &Address) -> Result<Measurement> {
        self.get_record(address).await
    }

    pub async fn get_ggo(&self, address: &Address) -> Result<Ggo> {
        self.get_record(address).await
    }

    pub async fn get_settlement(&self, address: &Address) -> Result<Settlement> {
        self.get_record(address).await
    }
}

fn decode_json<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    tracing::trace!(
        status = response.status,
        body = %String::from_utf8_lossy(&response.body),
        "ledger response"
    );
    serde_json::from_slice(&response.body).map_err(|e| ClientError::ResponseDecode(e.to_string()))
}
