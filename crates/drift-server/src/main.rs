//! `drift-server` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP export).
//! 3. Build the field [`Encryptor`] from `ENCRYPTION_KEY`; refuse to start
//!    if the secret is unusable.
//! 4. Compose the link store and [`LinkService`].
//! 5. Build the Axum router and serve until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use drift_server::{
    config::Config,
    link::{LinkService, MemoryLinkStore},
    server::{self, state::AppState},
    telemetry,
};
use fieldcrypt::Encryptor;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(
        cfg.otel_exporter_otlp_endpoint.as_deref(),
        cfg.effective_log_level(),
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %cfg.env,
        port = cfg.port,
        "drift-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Field encryption
    // -----------------------------------------------------------------------
    let encryptor = Arc::new(
        Encryptor::new(&cfg.encryption_key).context("failed to initialise field encryption")?,
    );
    info!("field encryption ready");

    // -----------------------------------------------------------------------
    // 4. Storage + services
    // -----------------------------------------------------------------------
    let store = Arc::new(MemoryLinkStore::new());
    let links = LinkService::new(store, encryptor);

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(links));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("drift-server stopped");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received; draining connections");
}
