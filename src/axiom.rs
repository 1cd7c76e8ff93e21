use crate::config::{LoggerConfig, DEFAULT_BASE_URL};
use crate::record::LogRecord;
use crate::transport::{encode_batch, Delivery, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Request};

/// Configuration for [`AxiomTransport`].
///
/// Records are POSTed as a JSON array to
/// `{base_url}/v1/datasets/{dataset}/ingest` with a bearer token.
#[derive(Clone, Debug)]
pub struct AxiomConfig {
    /// Base URL without path, e.g. "https://api.eu.axiom.co"
    pub base_url: String,
    pub dataset: String,
    pub token: String,
}

impl AxiomConfig {
    /// Take the ingestion settings out of a [`LoggerConfig`].
    ///
    /// Missing token or dataset become empty strings; the backend then
    /// rejects the request and the failure is logged at flush time.
    pub fn from_logger_config(config: &LoggerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            dataset: config.dataset.clone().unwrap_or_default(),
            token: config.token.clone().unwrap_or_default(),
        }
    }
}

impl Default for AxiomConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset: String::new(),
            token: String::new(),
        }
    }
}

/// Authenticated ingestion transport for server-side loggers.
#[derive(Clone)]
pub struct AxiomTransport {
    client: Client,
    config: AxiomConfig,
}

impl AxiomTransport {
    pub fn new(config: AxiomConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuse an existing `reqwest` client (connection pool, proxies, timeouts).
    pub fn with_client(client: Client, config: AxiomConfig) -> Self {
        Self { client, config }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/datasets/{}/ingest",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.dataset)
        )
    }

    /// Build the ingestion request for `batch` without sending it.
    pub fn build_request(&self, batch: &[LogRecord]) -> Result<Request, TransportError> {
        let body = encode_batch(batch)?;
        let request = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token))
            .body(body)
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl Transport for AxiomTransport {
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
        let request = self.build_request(batch)?;
        let resp = self.client.execute(request).await?;
        if resp.status().is_success() {
            Ok(Delivery::Confirmed)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(TransportError::Status { status, body })
        }
    }
}
