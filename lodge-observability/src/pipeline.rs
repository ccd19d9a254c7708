//! The access-log pipeline: record intake, flush scheduling, and shutdown.
//!
//! One spawned task owns every storage mutation. It loops over four event
//! sources — a ready batch, the flush timer, the archive timer, and the
//! shutdown signal — and handles them strictly one at a time, so batch
//! writes and rotation never overlap.

use crate::access_log::{RecordBuilder, RequestParts};
use crate::archiver;
use crate::catalogue::{Batch, Catalogue};
use crate::file_writer;
use lodge_core::LodgeError;
use lodge_core::config::AccessLogConfig;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info};

/// Capacity of the batch handoff channel. At most one cut batch waits while
/// the scheduler writes the previous one; appenders block beyond that.
const BATCH_CHANNEL_CAPACITY: usize = 1;

/// An explicitly constructed logging instance: counter, buffer, channel, and
/// scheduler task all live here, threaded through the serving layer by
/// reference — there is no ambient global state.
pub struct AccessLogPipeline {
    builder: RecordBuilder,
    catalogue: Arc<Catalogue>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AccessLogPipeline {
    /// Construct the pipeline and spawn its scheduler task.
    pub fn spawn(config: AccessLogConfig) -> Arc<Self> {
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let catalogue = Arc::new(Catalogue::new(config.batch_size, batch_tx));

        let worker = tokio::spawn(scheduler_loop(
            config,
            Arc::clone(&catalogue),
            batch_rx,
            shutdown_rx,
        ));

        Arc::new(Self {
            builder: RecordBuilder::new(),
            catalogue,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Record one completed request.
    ///
    /// Called from the serving middleware. Completes synchronously relative
    /// to the request except at the batch handoff, where a full channel
    /// blocks until the scheduler catches up.
    pub async fn record(&self, parts: RequestParts) {
        let record = self.builder.build(parts);
        self.catalogue.append(record).await;
    }

    /// Flush everything still buffered and stop the scheduler.
    ///
    /// Callers stop feeding [`record`](Self::record) first. When this
    /// returns, every accepted record is on disk and the scheduler task has
    /// exited. Idempotent: later calls find no worker and return.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                error!(error = %e, "Access log scheduler task failed");
            }
        }
    }
}

async fn scheduler_loop(
    config: AccessLogConfig,
    catalogue: Arc<Catalogue>,
    mut batch_rx: mpsc::Receiver<Batch>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let flush_period = config.flush_interval();
    let archive_period = config.archive_interval();
    // Timers first fire one full period after startup. An immediate archive
    // tick would rotate a file no batch has reached yet.
    let mut flush_timer = interval_at(Instant::now() + flush_period, flush_period);
    let mut archive_timer = interval_at(Instant::now() + archive_period, archive_period);

    info!(
        batch_size = config.batch_size,
        flush_secs = config.flush_interval_secs,
        archive_secs = config.archive_interval_secs,
        log = %config.log_path.display(),
        "Access log scheduler started"
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                final_drain(&config, &catalogue, &mut batch_rx).await;
                break;
            }
            Some(batch) = batch_rx.recv() => {
                persist(&config, batch);
            }
            _ = flush_timer.tick() => {
                let batch = catalogue.drain_all().await;
                if !batch.is_empty() {
                    persist(&config, batch);
                }
            }
            _ = archive_timer.tick() => {
                let batch = catalogue.drain_all().await;
                if !batch.is_empty() {
                    persist(&config, batch);
                }
                match archiver::rotate(&config.log_path, &config.archive_dir) {
                    Ok(Some(_)) => {}
                    Ok(None) => debug!("Archive timer fired with an empty log, skipped"),
                    Err(e) => storage_failure("rotate", &e),
                }
            }
        }
    }

    info!("Access log scheduler stopped");
}

/// Shutdown path: accept any batch still queued in the channel, then take
/// whatever remains in the catalogue, and write it all before the loop exits.
async fn final_drain(
    config: &AccessLogConfig,
    catalogue: &Catalogue,
    batch_rx: &mut mpsc::Receiver<Batch>,
) {
    while let Ok(batch) = batch_rx.try_recv() {
        persist(config, batch);
    }
    let batch = catalogue.drain_all().await;
    let count = batch.len();
    if !batch.is_empty() {
        persist(config, batch);
    }
    debug!(count, "Final access log drain complete");
}

fn persist(config: &AccessLogConfig, batch: Batch) {
    if let Err(e) = file_writer::write_batch(&config.log_path, &batch) {
        storage_failure("write", &e);
    }
}

/// Storage failure policy: log a diagnostic and terminate the process.
///
/// The pipeline cannot make forward progress once the log file is unwritable,
/// and batches are not retried elsewhere. Swapping this for a
/// degrade-and-report policy touches nothing outside this function.
fn storage_failure(stage: &str, err: &LodgeError) -> ! {
    error!(stage, error = %err, "Access log storage failure, terminating");
    std::process::exit(1);
}
