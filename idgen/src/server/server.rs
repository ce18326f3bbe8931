//! Router assembly and the server run loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

use super::config::IdServerConfig;
use super::handlers::{
    AppState, handle_healthy, handle_metrics, handle_next, handle_range, handle_ready,
};
use super::metrics::Metrics;
use super::middleware::ObserveLayer;
use crate::{IdAllocator, IdGenerator};

/// Builds the router serving `allocator` with a fresh metrics registry.
pub fn build_app(allocator: Arc<dyn IdAllocator>) -> Router {
    build_router(allocator, Arc::new(Metrics::new()))
}

fn build_router(allocator: Arc<dyn IdAllocator>, metrics: Arc<Metrics>) -> Router {
    let state = AppState {
        allocator,
        metrics: metrics.clone(),
    };

    Router::new()
        .route("/next", get(handle_next))
        .route("/range", get(handle_range))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(ObserveLayer::new(metrics))
        .with_state(state)
}

/// HTTP server for ID allocation.
pub struct IdServer {
    config: IdServerConfig,
}

impl IdServer {
    pub fn new(config: IdServerConfig) -> Self {
        Self { config }
    }

    /// Opens the generator, serves requests until ctrl-c, then flushes and
    /// closes storage.
    pub async fn run(self) -> anyhow::Result<()> {
        let generator = Arc::new(IdGenerator::open(self.config.generator).await?);
        let app = build_app(generator.allocator());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            addr = %addr,
            counter = %generator.counter_key(),
            "idgen server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("shutting down, flushing storage");
        generator.flush().await?;
        generator.close().await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
