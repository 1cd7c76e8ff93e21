use crate::record::LogRecord;
use crate::transport::{Delivery, Transport, TransportError};
use async_trait::async_trait;

/// A transport that accepts and discards every batch.
///
/// Useful for measuring the overhead of buffering and throttling without
/// any network I/O.
#[derive(Clone, Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn send_batch(&self, _batch: &[LogRecord]) -> Result<Delivery, TransportError> {
        Ok(Delivery::Confirmed)
    }
}
