use crate::record::LogRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered queue of records waiting for the next flush.
///
/// Appends preserve call order. [`EventBuffer::drain`] swaps the contents
/// out in one step, so anything pushed afterwards lands in a fresh batch.
#[derive(Debug, Default)]
pub struct EventBuffer {
    records: Mutex<Vec<LogRecord>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: LogRecord) {
        self.lock().push(record);
    }

    /// Take every buffered record and leave the buffer empty.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the Vec half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Origin, Severity};

    fn record(message: &str) -> LogRecord {
        LogRecord::build(Severity::Info, message, &[], Origin::Server, None)
    }

    #[test]
    fn drain_returns_records_in_push_order_and_clears() {
        let buffer = EventBuffer::new();
        buffer.push(record("a"));
        buffer.push(record("b"));
        buffer.push(record("c"));
        assert_eq!(buffer.len(), 3);

        let drained: Vec<_> = buffer.drain().into_iter().map(|r| r.message).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn pushes_after_drain_start_a_new_batch() {
        let buffer = EventBuffer::new();
        buffer.push(record("first"));
        let first = buffer.drain();
        buffer.push(record("second"));

        assert_eq!(first.len(), 1);
        assert_eq!(buffer.drain()[0].message, "second");
    }
}
