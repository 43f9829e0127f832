//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Validate value ranges (port in 1..=65535, durations > 0)
//! - Check that the log level is a usable filter directive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExporterConfig → Result<(), Vec<ValidationError>>
//! - Runs before any registrar or listener starts

use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::config::schema::ExporterConfig;

/// A single semantic problem in the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending setting, as spelled on the command line.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a resolved configuration.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("host", "must not be empty"));
    }

    match config.listener.port.parse::<u16>() {
        Ok(0) => errors.push(ValidationError::new("port", "must not be 0")),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            "port",
            format!("'{}' is not a valid port: {}", config.listener.port, e),
        )),
    }

    if let Err(e) = EnvFilter::try_new(&config.log_level) {
        errors.push(ValidationError::new(
            "loglevel",
            format!("'{}' is not a valid log filter: {}", config.log_level, e),
        ));
    }

    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::new("shutdown-timeout", "must be > 0"));
    }
    if config.timeouts.exec_secs == 0 {
        errors.push(ValidationError::new("exec-timeout", "must be > 0"));
    }
    if config.collection.sample_interval_secs == 0 {
        errors.push(ValidationError::new("sample-interval", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
