//! Transport abstraction for ledger requests.
//!
//! The client only needs two verbs: POST a body and GET a URL. Production
//! code uses [`http::HttpTransport`]; tests script responses with
//! [`scripted::ScriptedTransport`] or run against a simulated ledger.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{ClientError, Result};

/// Content type of an encoded batch list.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response carrying a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(|e| ClientError::Encode(e.to_string()))?;
        Ok(Self::new(status, body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for ledger requests.
///
/// Implementations must be thread-safe (Send + Sync). A non-2xx status is
/// not a transport error; only failures to complete the exchange are.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url`.
    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<RawResponse>;

    /// GET `url`.
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<RawResponse> {
        (**self).post(url, content_type, body).await
    }

    async fn get(&self, url: &str) -> Result<RawResponse> {
        (**self).get(url).await
    }
}

/// HTTP transport backed by reqwest.
pub mod http {
    use super::*;
    use crate::config::ClientConfig;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Client;

    /// Transport over HTTP(S).
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: Client,
    }

    impl HttpTransport {
        /// Build a transport honoring the configured timeout and user agent.
        pub fn new(config: &ClientConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(config.request_timeout)
                .user_agent(config.user_agent.as_str())
                .build()
                .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;
            Ok(Self { client })
        }

        /// Wrap an existing reqwest client.
        pub fn from_client(client: Client) -> Self {
            Self { client }
        }

        async fn read(response: reqwest::Response) -> Result<RawResponse> {
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| ClientError::Transport(format!("failed to read body: {}", e)))?;
            Ok(RawResponse { status, body })
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<RawResponse> {
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, content_type)
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::Transport(format!("POST {} failed: {}", url, e)))?;
            Self::read(response).await
        }

        async fn get(&self, url: &str) -> Result<RawResponse> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ClientError::Transport(format!("GET {} failed: {}", url, e)))?;
            Self::read(response).await
        }
    }
}

/// A transport that replays canned responses.
///
/// Each request pops the next scripted outcome and is recorded for later
/// inspection. Running out of script is a transport error.
pub mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// One request seen by the transport.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub url: String,
        pub content_type: Option<String>,
        pub body: Bytes,
    }

    #[derive(Debug)]
    enum Outcome {
        Respond(RawResponse),
        Fail(String),
    }

    /// Scripted transport implementation.
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Outcome>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response.
        pub async fn respond(&self, response: RawResponse) {
            self.script.lock().await.push_back(Outcome::Respond(response));
        }

        /// Queue a JSON response.
        pub async fn respond_json(&self, status: u16, value: &serde_json::Value) {
            self.respond(RawResponse::new(status, value.to_string())).await;
        }

        /// Queue a failure to complete the exchange.
        pub async fn fail(&self, reason: impl Into<String>) {
            self.script.lock().await.push_back(Outcome::Fail(reason.into()));
        }

        /// Requests seen so far.
        pub async fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().await.clone()
        }

        async fn next(&self, request: RecordedRequest) -> Result<RawResponse> {
            self.requests.lock().await.push(request);
            match self.script.lock().await.pop_front() {
                Some(Outcome::Respond(response)) => Ok(response),
                Some(Outcome::Fail(reason)) => Err(ClientError::Transport(reason)),
                None => Err(ClientError::Transport("no scripted response left".into())),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<RawResponse> {
            self.next(RecordedRequest {
                method: "POST",
                url: url.to_owned(),
                content_type: Some(content_type.to_owned()),
                body,
            })
            .await
        }

        async fn get(&self, url: &str) -> Result<RawResponse> {
            self.next(RecordedRequest {
                method: "GET",
                url: url.to_owned(),
                content_type: None,
                body: Bytes::new(),
            })
            .await
        }
    }
}
