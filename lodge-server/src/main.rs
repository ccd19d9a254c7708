// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Lodge — static site server with a durable access-log pipeline
//
//  Serving:  axum static files + SPA fallback
//  Logging:  batched access log, timer flush, daily gzip archive
//  Config:   YAML file + LODGE_ env overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use lodge_core::LodgeConfig;
use lodge_observability::AccessLogPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lodge", version, about = "Lodge — static site server with a durable access-log pipeline")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/lodge/lodge.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Lodge starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        LodgeConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        LodgeConfig::default()
    };

    // ── Access-log pipeline ──
    let pipeline = AccessLogPipeline::spawn(config.access_log.clone());

    // ── Site router ──
    let app = lodge_web::app::build_router(&config.server, Arc::clone(&pipeline));

    info!(
        addr = %config.server.addr,
        site = %config.server.static_dir.display(),
        log = %config.access_log.log_path.display(),
        "Lodge is ready — serving site"
    );

    // Serves until SIGINT/SIGTERM; graceful shutdown stops request intake
    // before the final flush below.
    lodge_web::app::serve(&config.server.addr, app, shutdown_signal()).await?;

    info!("Shutdown signal received, flushing access log");
    pipeline.shutdown().await;

    info!("Lodge stopped");
    Ok(())
}

/// Resolve on SIGINT (Ctrl+C) or SIGTERM (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
