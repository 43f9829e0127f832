//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router with the `/metrics` route
//! - Bind the listener inside a background serving task
//! - Stop accepting on request and drain in-flight scrapes within a bound
//! - Report the serving task's own failure (bind/accept) exactly once

use std::future::Future;
use std::time::Duration;

use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::http::handlers::get_metrics;
use crate::lifecycle::CompletionBarrier;
use crate::observability::MetricsRegistry;

/// Errors surfaced by a server lifecycle implementation.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// The accept loop stopped with an error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
    /// In-flight requests were still running when the drain window closed.
    #[error("graceful shutdown did not finish within {0:?}")]
    DrainTimeout(Duration),
    /// The serving task panicked or was cancelled.
    #[error("serving task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServerError {
    /// Whether the error means the server never served or stopped on its own.
    ///
    /// Drain and join problems happen while shutting down and are not fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Bind { .. } | ServerError::Serve(_))
    }
}

/// Start/stop capability the coordinator drives.
///
/// Implementations spawn their serving unit on the given barrier so the
/// coordinator can wait for it, and must tolerate `stop` being called more
/// than once.
pub trait ServerLifecycle: Send {
    /// Start serving on `bind_address` in the background. Returns immediately.
    fn start(&mut self, bind_address: &str, barrier: &CompletionBarrier);

    /// Stop accepting new connections and drain in-flight ones within `timeout`.
    fn stop(&mut self, timeout: Duration) -> impl Future<Output = Result<(), ServerError>> + Send;
}

/// Axum server exposing the metrics registry.
pub struct MetricsServer {
    router: Router,
    draining: CancellationToken,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl MetricsServer {
    /// Create a server whose only route is `GET /metrics`.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            router: Self::build_router(registry),
            draining: CancellationToken::new(),
            task: None,
        }
    }

    /// Merge extra routes next to `/metrics`.
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.router = self.router.merge(routes);
        self
    }

    fn build_router(registry: MetricsRegistry) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .with_state(registry)
            .layer(TraceLayer::new_for_http())
    }
}

impl ServerLifecycle for MetricsServer {
    fn start(&mut self, bind_address: &str, barrier: &CompletionBarrier) {
        let address = bind_address.to_string();
        let router = self.router.clone();
        let draining = self.draining.clone();

        let task = barrier.spawn(async move {
            let result = serve(address, router, draining).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "HTTP server error");
            }
            result
        });
        self.task = Some(task);
    }

    async fn stop(&mut self, timeout: Duration) -> Result<(), ServerError> {
        self.draining.cancel();

        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined?,
            Err(_) => {
                task.abort();
                Err(ServerError::DrainTimeout(timeout))
            }
        }
    }
}

async fn serve(
    address: String,
    router: Router,
    draining: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    tracing::info!(address = %local_addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { draining.cancelled().await })
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!(address = %local_addr, "HTTP server stopped");
    Ok(())
}
