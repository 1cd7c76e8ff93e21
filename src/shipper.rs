use crate::buffer::EventBuffer;
use crate::record::LogRecord;
use crate::transport::{Delivery, SettleReport, Transport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters describing what the shipper has done so far.
#[derive(Debug, Default)]
pub struct ShipperStats {
    /// Records appended to the buffer.
    pub buffered_records: AtomicU64,
    /// Batches handed to a background send, not yet confirmed.
    pub queued_batches: AtomicU64,
    pub queued_records: AtomicU64,
    /// Batches the backend confirmed, including settled queued ones.
    pub delivered_batches: AtomicU64,
    pub delivered_records: AtomicU64,
    /// Batches the transport rejected; their records are gone.
    pub failed_batches: AtomicU64,
    pub dropped_records: AtomicU64,
}

impl ShipperStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            buffered_records: self.buffered_records.load(Ordering::Relaxed),
            queued_batches: self.queued_batches.load(Ordering::Relaxed),
            queued_records: self.queued_records.load(Ordering::Relaxed),
            delivered_batches: self.delivered_batches.load(Ordering::Relaxed),
            delivered_records: self.delivered_records.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ShipperStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub buffered_records: u64,
    pub queued_batches: u64,
    pub queued_records: u64,
    pub delivered_batches: u64,
    pub delivered_records: u64,
    pub failed_batches: u64,
    pub dropped_records: u64,
}

/// Result of a single [`Shipper::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered; the transport was not called.
    Empty,
    /// The backend confirmed a batch of this many records.
    Delivered(usize),
    /// A batch of this many records was handed to a background send;
    /// [`Shipper::settle`] learns how it ended.
    Queued(usize),
    /// The transport failed and this many records were discarded.
    Failed(usize),
}

/// Couples the [`EventBuffer`] with a [`Transport`].
///
/// At most once, best effort: a batch is removed from the buffer before it
/// is sent and is never put back, whatever the transport reports.
pub struct Shipper {
    buffer: EventBuffer,
    transport: Arc<dyn Transport>,
    stats: ShipperStats,
}

impl Shipper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            buffer: EventBuffer::new(),
            transport,
            stats: ShipperStats::default(),
        }
    }

    pub fn push(&self, record: LogRecord) {
        self.buffer.push(record);
        self.stats.buffered_records.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain the buffer and hand the batch to the transport.
    ///
    /// The drain happens before the first suspension point, so records
    /// pushed while the send is in flight go to the next batch. Errors are
    /// reported through `tracing` and swallowed.
    pub async fn flush(&self) -> FlushOutcome {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let count = batch.len();
        match self.transport.send_batch(&batch).await {
            Ok(Delivery::Queued) => {
                self.stats.queued_batches.fetch_add(1, Ordering::Relaxed);
                self.stats.queued_records.fetch_add(count as u64, Ordering::Relaxed);
                tracing::trace!(records = count, "log batch queued");
                FlushOutcome::Queued(count)
            }
            Ok(Delivery::Confirmed) => {
                self.stats.delivered_batches.fetch_add(1, Ordering::Relaxed);
                self.stats.delivered_records.fetch_add(count as u64, Ordering::Relaxed);
                tracing::trace!(records = count, "log batch delivered");
                FlushOutcome::Delivered(count)
            }
            Err(e) => {
                self.stats.failed_batches.fetch_add(1, Ordering::Relaxed);
                self.stats.dropped_records.fetch_add(count as u64, Ordering::Relaxed);
                tracing::warn!(records = count, error = %e, "failed to deliver log batch, dropping it");
                FlushOutcome::Failed(count)
            }
        }
    }

    /// Wait for the transport's queued sends and fold their results into
    /// the stats.
    pub async fn settle(&self) -> SettleReport {
        let report = self.transport.settle().await;
        let stats = &self.stats;
        stats.delivered_batches.fetch_add(report.delivered_batches, Ordering::Relaxed);
        stats.delivered_records.fetch_add(report.delivered_records, Ordering::Relaxed);
        stats.failed_batches.fetch_add(report.failed_batches, Ordering::Relaxed);
        stats.dropped_records.fetch_add(report.dropped_records, Ordering::Relaxed);
        report
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &ShipperStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_transport::MemoryTransport;
    use crate::record::{Origin, Severity};
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use tokio::sync::{oneshot, Mutex as AsyncMutex};

    fn record(message: &str) -> LogRecord {
        LogRecord::build(Severity::Info, message, &[], Origin::Server, None)
    }

    #[tokio::test]
    async fn empty_flush_does_not_touch_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let shipper = Shipper::new(transport.clone());

        assert_eq!(shipper.flush().await, FlushOutcome::Empty);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn successful_flush_empties_buffer() {
        let transport = Arc::new(MemoryTransport::new());
        let shipper = Shipper::new(transport.clone());
        shipper.push(record("a"));
        shipper.push(record("b"));

        assert_eq!(shipper.flush().await, FlushOutcome::Delivered(2));
        assert_eq!(shipper.buffered(), 0);
        let stats = shipper.stats().snapshot();
        assert_eq!(stats.delivered_batches, 1);
        assert_eq!(stats.delivered_records, 2);
    }

    #[tokio::test]
    async fn failed_flush_drops_batch_without_requeue() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail_with(true);
        let shipper = Shipper::new(transport.clone());
        shipper.push(record("lost"));

        assert_eq!(shipper.flush().await, FlushOutcome::Failed(1));
        assert_eq!(shipper.buffered(), 0);
        assert_eq!(shipper.stats().snapshot().dropped_records, 1);

        // nothing left to retry
        transport.fail_with(false);
        assert_eq!(shipper.flush().await, FlushOutcome::Empty);
        assert!(transport.records().is_empty());
    }

    /// Blocks inside `send_batch` until released, so the test can append
    /// while a send is in flight.
    struct GatedTransport {
        entered: AsyncMutex<Option<oneshot::Sender<()>>>,
        release: AsyncMutex<Option<oneshot::Receiver<()>>>,
        inner: MemoryTransport,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
            if let Some(entered) = self.entered.lock().await.take() {
                let _ = entered.send(());
            }
            if let Some(release) = self.release.lock().await.take() {
                let _ = release.await;
            }
            self.inner.send_batch(batch).await
        }
    }

    #[tokio::test]
    async fn records_pushed_during_send_go_to_next_batch() {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let transport = Arc::new(GatedTransport {
            entered: AsyncMutex::new(Some(entered_tx)),
            release: AsyncMutex::new(Some(release_rx)),
            inner: MemoryTransport::new(),
        });
        let shipper = Arc::new(Shipper::new(transport.clone()));
        shipper.push(record("first"));

        let in_flight = tokio::spawn({
            let shipper = Arc::clone(&shipper);
            async move { shipper.flush().await }
        });
        entered_rx.await.unwrap();

        shipper.push(record("second"));
        assert_eq!(shipper.buffered(), 1);
        release_tx.send(()).unwrap();
        assert_eq!(in_flight.await.unwrap(), FlushOutcome::Delivered(1));

        assert_eq!(shipper.flush().await, FlushOutcome::Delivered(1));
        let batches = transport.inner.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].message, "first");
        assert_eq!(batches[1][0].message, "second");
    }

    /// Queues every batch and confirms them all on settle.
    #[derive(Default)]
    struct QueueingTransport {
        queued: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Transport for QueueingTransport {
        async fn send_batch(&self, batch: &[LogRecord]) -> Result<Delivery, TransportError> {
            self.queued.lock().unwrap().push(batch.len());
            Ok(Delivery::Queued)
        }

        async fn settle(&self) -> SettleReport {
            let queued = std::mem::take(&mut *self.queued.lock().unwrap());
            SettleReport {
                delivered_batches: queued.len() as u64,
                delivered_records: queued.iter().sum::<usize>() as u64,
                ..SettleReport::default()
            }
        }
    }

    #[tokio::test]
    async fn queued_batches_count_as_delivered_only_after_settle() {
        let shipper = Shipper::new(Arc::new(QueueingTransport::default()));
        shipper.push(record("a"));
        shipper.push(record("b"));

        assert_eq!(shipper.flush().await, FlushOutcome::Queued(2));
        let stats = shipper.stats().snapshot();
        assert_eq!(stats.queued_batches, 1);
        assert_eq!(stats.queued_records, 2);
        assert_eq!(stats.delivered_batches, 0);

        let report = shipper.settle().await;
        assert_eq!(report.delivered_records, 2);
        let stats = shipper.stats().snapshot();
        assert_eq!(stats.delivered_batches, 1);
        assert_eq!(stats.delivered_records, 2);
    }
}
