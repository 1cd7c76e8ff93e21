use crate::record::LogRecord;
use crate::transport::{Delivery, Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Transport that keeps every delivered batch in memory.
///
/// Meant for tests of code that logs: inspect [`MemoryTransport::batches`]
/// after a flush, or call [`MemoryTransport::fail_with`] to simulate an
/// unreachable backend.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    batches: Mutex<Vec<Vec<LogRecord>>>,
    attempts: Mutex<usize>,
    failing: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (`true`) or succeed (`false`).
    pub fn fail_with(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Batches accepted so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<LogRecord>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// All accepted records flattened in delivery order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.batches().into_iter().flatten().collect()
    }

    /// Number of `send_batch` calls, failed ones included.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("memory transport set to fail".to_string()));
        }
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.to_vec());
        Ok(Delivery::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Origin, Severity};

    #[tokio::test]
    async fn records_batches_and_failures() {
        let transport = MemoryTransport::new();
        let record = LogRecord::build(Severity::Info, "one", &[], Origin::Server, None);

        transport.send_batch(&[record.clone()]).await.unwrap();
        transport.fail_with(true);
        assert!(transport.send_batch(&[record]).await.is_err());

        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.batches().len(), 1);
        assert_eq!(transport.records()[0].message, "one");
    }
}
