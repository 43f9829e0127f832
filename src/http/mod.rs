//! HTTP exposition subsystem.
//!
//! # Data Flow
//! ```text
//! Prometheus scrape (GET /metrics)
//!     → server.rs (Axum setup, trace layer, graceful shutdown)
//!     → handlers.rs (render the shared registry)
//!     → text exposition format back to the collector
//! ```

pub mod handlers;
pub mod server;

pub use handlers::PROMETHEUS_CONTENT_TYPE;
pub use server::{MetricsServer, ServerError, ServerLifecycle};
