use crate::config::{LoggerConfig, DEFAULT_PROXY_PATH};
use crate::record::LogRecord;
use crate::transport::{encode_batch, Delivery, SettleReport, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Request};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Best-effort transport that posts batches to a same-origin proxy path.
///
/// In beacon mode the request runs on a background task and `send_batch`
/// returns [`Delivery::Queued`] as soon as it is spawned, so emitting
/// code never waits on the network. Those tasks are tracked:
/// [`Transport::settle`] (called by `Logger::flush_now`) waits for them,
/// so a caller that flushes before exiting does not lose the last batch.
/// Without beacon mode, or without a runtime to queue on, it falls back
/// to a regular awaited POST.
#[derive(Clone)]
pub struct BeaconTransport {
    client: Client,
    /// Full URL of the proxy, e.g. "https://app.example.com/log".
    url: String,
    beacon: bool,
    in_flight: Arc<InFlight>,
}

/// Handles of queued beacons and the tally of those that finished.
#[derive(Default)]
struct InFlight {
    handles: Mutex<Vec<JoinHandle<()>>>,
    delivered_batches: AtomicU64,
    delivered_records: AtomicU64,
    failed_batches: AtomicU64,
    dropped_records: AtomicU64,
}

impl InFlight {
    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    fn record(&self, records: u64, result: &Result<(), TransportError>) {
        match result {
            Ok(()) => {
                self.delivered_batches.fetch_add(1, Ordering::Relaxed);
                self.delivered_records.fetch_add(records, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed_batches.fetch_add(1, Ordering::Relaxed);
                self.dropped_records.fetch_add(records, Ordering::Relaxed);
            }
        }
    }

    fn take_report(&self) -> SettleReport {
        SettleReport {
            delivered_batches: self.delivered_batches.swap(0, Ordering::Relaxed),
            delivered_records: self.delivered_records.swap(0, Ordering::Relaxed),
            failed_batches: self.failed_batches.swap(0, Ordering::Relaxed),
            dropped_records: self.dropped_records.swap(0, Ordering::Relaxed),
        }
    }
}

impl BeaconTransport {
    pub fn new(base_url: &str, proxy_path: &str) -> Self {
        Self {
            client: Client::new(),
            url: join_url(base_url, proxy_path),
            beacon: true,
            in_flight: Arc::default(),
        }
    }

    pub fn from_logger_config(config: &LoggerConfig) -> Self {
        Self::new(&config.base_url, &config.proxy_path)
    }

    /// Disable background sends; every batch is awaited.
    pub fn without_beacon(mut self) -> Self {
        self.beacon = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queued beacons that have not finished yet.
    pub fn pending(&self) -> usize {
        let handles = self.in_flight.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn build_request(&self, batch: &[LogRecord]) -> Result<Request, TransportError> {
        let body = encode_batch(batch)?;
        let request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()?;
        Ok(request)
    }
}

async fn post(client: &Client, request: Request) -> Result<(), TransportError> {
    let resp = client.execute(request).await?;
    if resp.status().is_success() {
        Ok(())
    } else {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
        Err(TransportError::Status { status, body })
    }
}

#[async_trait]
impl Transport for BeaconTransport {
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
        let request = self.build_request(batch)?;

        if self.beacon {
            if let Ok(handle) = Handle::try_current() {
                let client = self.client.clone();
                let url = self.url.clone();
                let in_flight = Arc::clone(&self.in_flight);
                let records = batch.len() as u64;
                let task = handle.spawn(async move {
                    let result = post(&client, request).await;
                    if let Err(e) = &result {
                        tracing::warn!(url = %url, error = %e, "log beacon failed");
                    }
                    in_flight.record(records, &result);
                });
                self.in_flight.track(task);
                return Ok(Delivery::Queued);
            }
        }

        post(&self.client, request).await?;
        Ok(Delivery::Confirmed)
    }

    async fn settle(&self) -> SettleReport {
        let handles = std::mem::take(
            &mut *self.in_flight.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "log beacon task did not complete");
            }
        }
        self.in_flight.take_report()
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let path = if path.is_empty() { DEFAULT_PROXY_PATH } else { path };
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
