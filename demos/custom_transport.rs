use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use throttled_log_sink::{
    Delivery, Deployment, LogRecord, Logger, LoggerConfig, OutputModes, Transport, TransportError,
};
use tokio::time::{sleep, Duration};

/// Example of shipping batches somewhere this crate has no transport for
/// by implementing `Transport` directly.
struct StdoutTransport;

#[async_trait]
impl Transport for StdoutTransport {
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
        let body = throttled_log_sink::transport::encode_batch(batch)?;
        println!("[stdout-transport] {} records: {}", batch.len(), body);
        Ok(Delivery::Confirmed)
    }
}

#[tokio::main]
async fn main() {
    let config = LoggerConfig {
        deployment: Deployment::Local,
        modes: Some(OutputModes { console: true, remote: true }),
        throttle_window: Duration::from_millis(200),
        ..Default::default()
    };
    let logger = Logger::with_console(
        config,
        Arc::new(StdoutTransport),
        Box::new(throttled_log_sink::console::StderrConsole),
    );

    logger.info("custom transport example started", &[]);
    logger.error("simulated failure", &[json!({"db": "orders"})]);

    sleep(Duration::from_millis(500)).await;
}
