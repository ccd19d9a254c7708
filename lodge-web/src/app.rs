//! Site router: static files, SPA fallback, and the access-log layer.

use crate::middleware::access_log;
use axum::{Router, middleware};
use lodge_core::config::ServerConfig;
use lodge_observability::AccessLogPipeline;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

/// Build the site router.
///
/// Every request is served from `static_dir`; unknown paths fall back to
/// `index.html` when SPA routing is enabled. The access-log middleware wraps
/// the whole service, so fallback responses are logged like any other.
pub fn build_router(site: &ServerConfig, pipeline: Arc<AccessLogPipeline>) -> Router {
    let router = if site.spa_fallback {
        let index = site.static_dir.join("index.html");
        Router::new()
            .fallback_service(ServeDir::new(&site.static_dir).not_found_service(ServeFile::new(index)))
    } else {
        Router::new().fallback_service(ServeDir::new(&site.static_dir))
    };

    router.layer(middleware::from_fn_with_state(pipeline, access_log))
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Site server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
