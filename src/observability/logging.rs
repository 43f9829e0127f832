//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Honour `RUST_LOG` first, then the `--loglevel` setting
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Plain fmt output with targets; the exporter runs as a service and logs to stdout

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Initialize the global tracing subscriber.
///
/// `level` is any `EnvFilter` directive (e.g. `debug` or
/// `info,ovn_exporter=trace`) and is only used when `RUST_LOG` is unset.
pub fn init_tracing(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}
