//! eventrouter runtime - process bootstrap
//!
//! Provides [`run()`], which wires configuration, tracing, the Kubernetes
//! informer, the router, and the metrics server together and runs until
//! SIGINT or SIGTERM.
//!
//! # Quick start
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     eventrouter_runtime::run().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

use eventrouter::config::{Config, LogFormat};
use eventrouter::{CounterRegistry, KubeEventInformer, MetricsServer, Router};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the event router with configuration from the environment.
///
/// Returns once a shutdown signal has been received and the sinks have
/// been flushed, or with an error if startup fails (bad configuration, no
/// cluster access, informer never synced).
pub async fn run() -> anyhow::Result<()> {
    // ── 1. Load config from env ──────────────────────────────
    let config = Config::from_env()?;

    // ── 2. Init tracing ──────────────────────────────────────
    init_tracing(&config);

    info!(
        counting = config.enable_prometheus,
        sinks = ?config.sinks,
        metrics_addr = %config.metrics_addr,
        namespace = config.namespace.as_deref().unwrap_or("*"),
        "Starting eventrouter"
    );

    // ── 3. Counters + router ─────────────────────────────────
    let counters = Arc::new(CounterRegistry::new()?);
    let router = Arc::new(
        Router::new(counters, config.build_sinks(), config.enable_prometheus)?
            .with_sync_timeout(config.sync_timeout),
    );

    // ── 4. Informer ──────────────────────────────────────────
    let client = kube::Client::try_default().await?;
    let mut informer =
        KubeEventInformer::new(client, config.namespace.as_deref(), config.resync_period);
    informer.add_event_handler(router.clone());
    let synced = informer.has_synced();

    let (stop_tx, stop_rx) = watch::channel(false);
    let informer_handle = tokio::spawn(informer.run(stop_rx.clone()));

    // ── 5. Metrics HTTP server ───────────────────────────────
    let metrics_handle = MetricsServer::start(config.metrics_addr, router.clone(), synced.clone());

    // ── 6. Shutdown signal ───────────────────────────────────
    let signal_handle = tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    // ── 7. Serve ─────────────────────────────────────────────
    let served = router.run(synced, stop_rx).await;

    // ── 8. Shutdown ──────────────────────────────────────────
    signal_handle.abort();
    informer_handle.abort();
    metrics_handle.abort();
    router.sinks().shutdown().await?;

    served?;
    info!("eventrouter shutdown complete");
    Ok(())
}

/// Initialise the tracing subscriber based on config.
fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
