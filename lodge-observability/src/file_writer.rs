//! Durable writer for the live access log file.
//!
//! The file format is JSON Lines: one serialised [`LogRecord`] per line,
//! appended batch by batch. Every line boundary is a well-formed record, so
//! the file can be tailed, grepped, or shipped without framing tricks.

use crate::catalogue::Batch;
use lodge_core::LodgeError;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Append a batch to the live log file, creating it (and parent directories)
/// if absent.
///
/// The file is opened, written, and closed within the call — no handle
/// survives between batches, so the archiver is free to truncate the file
/// in between. Errors propagate to the caller; the scheduler decides what a
/// storage failure means.
pub fn write_batch(path: &Path, batch: &Batch) -> Result<(), LodgeError> {
    if batch.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for record in batch {
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!(count = batch.len(), path = %path.display(), "Flushed access log batch");
    Ok(())
}
