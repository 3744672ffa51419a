//! Client configuration.

use std::time::Duration;

use origin_ledger_core::Address;

/// Ledger client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root URL of the ledger REST API.
    pub base_url: String,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8008".into(),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("origin-ledger-sdk/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    /// Configuration for the ledger at `base_url`, other fields default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Batch ingress endpoint.
    pub fn batches_url(&self) -> String {
        format!("{}/batches", self.base())
    }

    /// State endpoint for one address.
    pub fn state_url(&self, address: &Address) -> String {
        format!("{}/state/{}", self.base(), address)
    }
}
