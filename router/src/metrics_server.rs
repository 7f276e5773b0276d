//! HTTP server for Prometheus metrics and health checks
//!
//! Runs a lightweight HTTP server on its own address for Prometheus
//! scraping and Kubernetes liveness and readiness checks.
//!
//! # Endpoints
//!
//! - `GET /metrics` - event counters plus router self-metrics
//! - `GET /healthz` - liveness, always 200
//! - `GET /readyz` - 200 once the informer cache has synced and every sink
//!   reports healthy, 503 otherwise
//!
//! # Example
//!
//! ```ignore
//! use eventrouter::metrics_server::MetricsServer;
//!
//! let handle = MetricsServer::start(addr, router.clone(), informer.has_synced());
//! ```

use crate::controller::Router as EventRouter;
use crate::informer::HasSynced;
use axum::extract::State;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shared state for the metrics server
#[derive(Clone)]
struct AppState {
    router: Arc<EventRouter>,
    synced: HasSynced,
}

/// Metrics HTTP server
pub struct MetricsServer;

impl MetricsServer {
    /// Start the metrics server on `addr`
    ///
    /// Returns a JoinHandle that can be used to abort the server.
    /// The server runs until aborted or the process exits.
    pub fn start(
        addr: SocketAddr,
        router: Arc<EventRouter>,
        synced: HasSynced,
    ) -> JoinHandle<()> {
        let app = app(AppState { router, synced });

        tokio::spawn(async move {
            info!(%addr, "Metrics server starting");

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, %addr, "Failed to bind metrics server");
                    return;
                }
            };

            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "Metrics server error");
            }
        })
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .route("/readyz", get(ready_handler))
        .with_state(state)
}

/// Handler for /metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.router.counters().gather(),
    )
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    if !state.synced.is_synced() {
        return (StatusCode::SERVICE_UNAVAILABLE, "informer cache not synced".to_string());
    }

    let mut unhealthy: Vec<String> = state
        .router
        .sinks()
        .health()
        .await
        .into_iter()
        .filter(|(_, healthy)| !healthy)
        .map(|(name, _)| name)
        .collect();

    if unhealthy.is_empty() {
        (StatusCode::OK, "ready".to_string())
    } else {
        unhealthy.sort();
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("unhealthy sinks: {}", unhealthy.join(", ")),
        )
    }
}
