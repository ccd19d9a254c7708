//! In-memory buffer of not-yet-persisted access log records.

use crate::access_log::LogRecord;
use tokio::sync::{Mutex, mpsc};
use tracing::error;

/// An ordered group of records cut from the catalogue for a single write.
pub type Batch = Vec<LogRecord>;

/// Mutex-guarded buffer feeding the batch channel.
///
/// Producers append under the lock. Records leave the buffer only as a
/// contiguous prefix of exactly `batch_size` (threshold cut) or wholesale
/// through [`Catalogue::drain_all`].
pub struct Catalogue {
    records: Mutex<Vec<LogRecord>>,
    batch_size: usize,
    tx: mpsc::Sender<Batch>,
}

impl Catalogue {
    pub fn new(batch_size: usize, tx: mpsc::Sender<Batch>) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(batch_size)),
            batch_size,
            tx,
        }
    }

    /// Append one record, cutting a batch when the threshold is reached.
    ///
    /// The handoff happens while the lock is still held: batches arrive on
    /// the channel in cut order, and a full channel blocks the appender until
    /// the scheduler accepts the previous batch. That block is the pipeline's
    /// deliberate backpressure point.
    pub async fn append(&self, record: LogRecord) {
        let mut records = self.records.lock().await;
        records.push(record);
        if records.len() >= self.batch_size {
            let batch: Batch = records.drain(..self.batch_size).collect();
            if self.tx.send(batch).await.is_err() {
                // Scheduler gone — nothing downstream can accept the batch.
                error!("batch channel closed, records dropped");
            }
        }
    }

    /// Remove and return everything currently buffered, possibly nothing.
    pub async fn drain_all(&self) -> Batch {
        let mut records = self.records.lock().await;
        std::mem::take(&mut *records)
    }

    /// Number of buffered records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
