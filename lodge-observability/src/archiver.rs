//! Daily rotation of the live access log into dated gzip archives.

use chrono::Utc;
use flate2::{Compression, write::GzEncoder};
use lodge_core::LodgeError;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Rotate the live log file into `<archive_dir>/<YYYY-MM-DD>.gz`.
///
/// The compressed copy is written before the live file is truncated: a
/// failure mid-rotation leaves records duplicated, never lost. Returns the
/// archive path, or `None` when the live file is missing or empty (idle
/// periods produce no zero-byte archives).
///
/// Must only run from the flush scheduler, which serialises rotation against
/// batch writes. An archive that already exists for the date is never touched;
/// the new one gets a numeric suffix (`2025-01-15-2.gz`, `-3`, …).
pub fn rotate(log_path: &Path, archive_dir: &Path) -> Result<Option<PathBuf>, LodgeError> {
    let contents = match fs::read(log_path) {
        Ok(bytes) if bytes.is_empty() => return Ok(None),
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    fs::create_dir_all(archive_dir)?;
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let archive_path = archive_path_for(archive_dir, &date);

    let mut encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
    encoder.write_all(&contents)?;
    encoder.finish()?;

    // Truncate only once the compressed copy exists on disk.
    File::create(log_path)?;

    info!(
        bytes = contents.len(),
        archive = %archive_path.display(),
        "Rotated access log"
    );
    Ok(Some(archive_path))
}

/// First unused archive path for the date: `<date>.gz`, then `<date>-2.gz`, …
fn archive_path_for(dir: &Path, date: &str) -> PathBuf {
    let primary = dir.join(format!("{date}.gz"));
    if !primary.exists() {
        return primary;
    }
    let mut n = 2u32;
    loop {
        let candidate = dir.join(format!("{date}-{n}.gz"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(path: &Path) -> Vec<u8> {
        let mut decoder = GzDecoder::new(File::open(path).unwrap());
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn rotate_roundtrips_exact_bytes_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("access.log");
        let archive_dir = dir.path().join("archive");
        let payload = b"{\"id\":1}\n{\"id\":2}\n".to_vec();
        fs::write(&log_path, &payload).unwrap();

        let archive = rotate(&log_path, &archive_dir).unwrap().expect("archive written");

        assert_eq!(fs::metadata(&log_path).unwrap().len(), 0);
        assert_eq!(gunzip(&archive), payload);
        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        let date = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(name, format!("{date}.gz"));
    }

    #[test]
    fn missing_live_file_skips_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let result = rotate(&dir.path().join("absent.log"), &dir.path().join("archive")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn empty_live_file_skips_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("access.log");
        fs::write(&log_path, b"").unwrap();

        let result = rotate(&log_path, &dir.path().join("archive")).unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("archive").exists(), "no archive dir for a no-op");
    }

    #[test]
    fn same_day_rotation_disambiguates_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("access.log");
        let archive_dir = dir.path().join("archive");

        fs::write(&log_path, b"first\n").unwrap();
        let first = rotate(&log_path, &archive_dir).unwrap().unwrap();

        fs::write(&log_path, b"second\n").unwrap();
        let second = rotate(&log_path, &archive_dir).unwrap().unwrap();

        assert_ne!(first, second);
        let date = Utc::now().format("%Y-%m-%d").to_string();
        assert!(second.file_name().unwrap().to_string_lossy().starts_with(&format!("{date}-")));
        // The earlier archive is untouched
        assert_eq!(gunzip(&first), b"first\n");
        assert_eq!(gunzip(&second), b"second\n");
    }

    #[test]
    fn suffix_counter_skips_every_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path()).unwrap();
        let date = "2025-01-15";
        File::create(dir.path().join(format!("{date}.gz"))).unwrap();
        File::create(dir.path().join(format!("{date}-2.gz"))).unwrap();

        let next = archive_path_for(dir.path(), date);
        assert_eq!(next, dir.path().join(format!("{date}-3.gz")));
    }
}
