//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registrars and samplers produce:
//!     → metrics.rs (gauges and counters in the shared registry)
//!     → logging.rs (structured log events)
//!
//! Consumers:
//!     → /metrics endpoint (Prometheus scrape)
//!     → stdout (log aggregation)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every log event, no string formatting of values
//! - Metrics are cheap (atomic updates)
//! - One registry per process, passed explicitly

pub mod logging;
pub mod metrics;

pub use self::metrics::MetricsRegistry;
