//! Access-log middleware for the site router.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use http::HeaderMap;
use lodge_observability::{AccessLogPipeline, RequestParts};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Capture one access-log record per request.
///
/// Metadata is taken before the handler runs (start timestamp, method, full
/// URL, headers, tracked `id` query parameter); latency is measured across
/// the handler; the record is appended after the response is produced. The
/// response itself passes through untouched.
pub async fn access_log(
    State(pipeline): State<Arc<AccessLogPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let started_at = Utc::now();
    let clock = Instant::now();
    let method = request.method().to_string();
    let url = request.uri().to_string();
    let headers = header_multimap(request.headers());
    let query_id = query_param(request.uri().query(), "id");

    let response = next.run(request).await;

    pipeline
        .record(RequestParts {
            started_at,
            method,
            url,
            headers,
            query_id,
            latency_ms: clock.elapsed().as_millis() as u64,
        })
        .await;

    response
}

/// Header map → name → values in received order.
fn header_multimap(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Value of `name` in a raw query string; empty when absent. Values are kept
/// as received, without percent-decoding.
fn query_param(query: Option<&str>, name: &str) -> String {
    let Some(query) = query else {
        return String::new();
    };
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().unwrap_or("").to_string();
        }
    }
    String::new()
}
