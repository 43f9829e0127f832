//! OVN/OVS Prometheus exporter library.
//!
//! The binary in `main.rs` wires these pieces together; tests drive them
//! directly with an isolated registry and a scripted command runner.

pub mod collectors;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ExporterConfig;
pub use error::ExporterError;
pub use http::MetricsServer;
pub use lifecycle::Coordinator;
pub use observability::MetricsRegistry;

/// Crate version, reported in `ovn_exporter_build_info`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
