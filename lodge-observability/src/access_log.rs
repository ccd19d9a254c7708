//! Access log records and the identifier-allocating builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Structured access log record — one per completed HTTP request.
///
/// Immutable once built. Identifiers are unique and strictly increasing in
/// assignment order for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,
    /// RFC 3339 UTC timestamp taken at the start of the request.
    pub timestamp: String,
    pub method: String,
    /// Full request URL including the query string.
    pub url: String,
    /// Header name → values in received order.
    pub headers: BTreeMap<String, Vec<String>>,
    /// Value of the tracked `id` query parameter; empty when absent.
    pub query_id: String,
    /// End-to-end latency in whole milliseconds. 0 is legitimate for fast
    /// synchronous handlers.
    pub latency_ms: u64,
}

/// Request metadata captured by the serving middleware.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub started_at: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub query_id: String,
    pub latency_ms: u64,
}

/// Builds one [`LogRecord`] per request, allocating identifiers from an
/// atomic counter.
///
/// The counter is deliberately decoupled from the catalogue lock: id
/// assignment never waits on buffering or I/O.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    next_id: AtomicU64,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(0) }
    }

    /// Assemble the record for one completed request. Ids start at 1.
    /// Construction never fails.
    pub fn build(&self, parts: RequestParts) -> LogRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        LogRecord {
            id,
            timestamp: parts.started_at.to_rfc3339(),
            method: parts.method,
            url: parts.url,
            headers: parts.headers,
            query_id: parts.query_id,
            latency_ms: parts.latency_ms,
        }
    }
}
