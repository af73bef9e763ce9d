//! Web layer
//!
//! HTTP interface for the retention subsystem. Handlers are thin; business
//! logic lives in the service layer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::WebConfig;
use crate::services::{CleanupScheduler, RetentionService};

pub mod handlers;
pub mod responses;

pub use responses::ApiResponse;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub retention: Arc<RetentionService>,
    pub scheduler: Arc<CleanupScheduler>,
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .with_context(|| {
                format!("Invalid web listen address {}:{}", config.host, config.port)
            })?;

        let api = Router::new()
            .route("/storage/analysis", get(handlers::storage::analyze_primary))
            .route(
                "/storage/volumes/{id}/analysis",
                get(handlers::storage::analyze_volume),
            )
            .route(
                "/storage/volumes/{id}/retention",
                put(handlers::storage::set_retention),
            )
            .route(
                "/storage/volumes/{id}/cleanup",
                post(handlers::storage::cleanup_volume),
            )
            .route("/storage/scheduler", get(handlers::storage::scheduler_status))
            .route(
                "/storage/scheduler/run",
                post(handlers::storage::run_cleanup),
            );

        let app = Router::new()
            .route("/health", get(health))
            .nest("/api/v1", api)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        Ok(Self { app, addr })
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        info!("Web server listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Web server error")?;
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
