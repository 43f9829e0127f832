//! Top-level error for the exporter binary.

use thiserror::Error;

use crate::collectors::RegistrarError;
use crate::config::ConfigError;
use crate::lifecycle::LifecycleError;
use crate::observability::logging::TryInitError;

/// Every way a run of the exporter can end in failure. Each maps to exit code 1.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] TryInitError),
    #[error("registrar startup failed: {0}")]
    Registrar(#[from] RegistrarError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
