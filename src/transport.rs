use crate::record::LogRecord;
use async_trait::async_trait;

/// Destination for batches of [`LogRecord`]s drained from the buffer.
///
/// Implementations move a batch to a concrete backend (an ingestion API,
/// a beacon proxy, memory, ...). Delivery is best-effort: the caller logs
/// an `Err` and drops the batch, it is never retried or re-queued.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one batch, preserving its order.
    ///
    /// **Parameters**
    /// - `batch`: non-empty slice of records in emission order.
    ///
    /// **Returns**
    /// - `Ok(Delivery::Confirmed)` once the backend accepted the batch.
    /// - `Ok(Delivery::Queued)` if the batch was handed to a background
    ///   send whose result is reported later by [`Transport::settle`].
    /// - `Err(..)` on serialization, network or HTTP status failures.
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError>;

    /// Wait for every queued background send and report how they ended.
    ///
    /// Each queued batch is reported exactly once. Default implementation
    /// has nothing queued.
    async fn settle(&self) -> SettleReport {
        SettleReport::default()
    }
}

/// How a successful [`Transport::send_batch`] left the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Confirmed,
    Queued,
}

/// Outcome of queued sends collected by [`Transport::settle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub delivered_batches: u64,
    pub delivered_records: u64,
    pub failed_batches: u64,
    pub dropped_records: u64,
}

/// Error returned by a [`Transport`] when a batch could not be delivered.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("failed to serialize log batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("ingestion endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport rejected batch: {0}")]
    Rejected(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(Box::new(e))
    }
}

/// Wire format shared by the HTTP transports: a JSON array of records.
pub fn encode_batch(batch: &[LogRecord]) -> Result<String, TransportError> {
    Ok(serde_json::to_string(batch)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Origin, Severity};
    use serde_json::{json, Value};

    #[test]
    fn batch_encodes_as_json_array_in_order() {
        let batch = vec![
            LogRecord::build(Severity::Info, "start", &[], Origin::Server, None),
            LogRecord::build(Severity::Error, "fail", &[json!({"code": 7})], Origin::Server, None),
        ];
        let body = encode_batch(&batch).unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["message"], json!("start"));
        assert_eq!(items[1]["level"], json!("error"));
        assert_eq!(items[1]["props"]["code"], json!(7));
    }

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = TransportError::Status { status: 403, body: "invalid token".to_string() };
        assert_eq!(
            err.to_string(),
            "ingestion endpoint responded with status 403: invalid token"
        );
    }
}
