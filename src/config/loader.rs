//! Configuration resolution from flags and environment.
//!
//! Every flag can also be set through an environment variable named
//! `OVN_EXPORTER_<FLAG>` (dashes become underscores). A flag given on the
//! command line wins over the environment, which wins over the default.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::schema::{CollectionConfig, ExporterConfig, ListenerConfig, TimeoutConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment variable the exporter reads.
pub const ENV_PREFIX: &str = "OVN_EXPORTER";

/// Error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Parse(#[from] clap::Error),
    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prometheus exporter for OVN and Open vSwitch.
#[derive(Debug, Parser)]
#[command(name = "ovn-exporter", version)]
#[command(about = "Expose OVN/OVS control plane metrics for Prometheus", long_about = None)]
pub struct Cli {
    /// Log level or filter directive
    #[arg(long, env = "OVN_EXPORTER_LOGLEVEL", default_value = "debug")]
    pub loglevel: String,

    /// Prometheus server host
    #[arg(long, env = "OVN_EXPORTER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Prometheus server port
    #[arg(long, env = "OVN_EXPORTER_PORT", default_value = "9310")]
    pub port: String,

    /// Seconds allowed for in-flight scrapes to finish on shutdown
    #[arg(long, env = "OVN_EXPORTER_SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// Seconds between two samples of the control plane
    #[arg(long, env = "OVN_EXPORTER_SAMPLE_INTERVAL", default_value_t = 30)]
    pub sample_interval: u64,

    /// Seconds before a single ovs/ovn command is abandoned
    #[arg(long, env = "OVN_EXPORTER_EXEC_TIMEOUT", default_value_t = 5)]
    pub exec_timeout: u64,

    /// Directory holding the OVN control sockets
    #[arg(long, env = "OVN_EXPORTER_OVN_RUNDIR", default_value = "/var/run/ovn")]
    pub ovn_rundir: PathBuf,

    /// Directory holding the OVN database files
    #[arg(long, env = "OVN_EXPORTER_OVN_DBDIR", default_value = "/var/lib/ovn")]
    pub ovn_dbdir: PathBuf,
}

impl Cli {
    /// Turn parsed arguments into a validated configuration.
    pub fn resolve(self) -> Result<ExporterConfig, ConfigError> {
        let config = ExporterConfig {
            listener: ListenerConfig {
                host: self.host,
                port: self.port,
            },
            log_level: self.loglevel,
            timeouts: TimeoutConfig {
                shutdown_secs: self.shutdown_timeout,
                exec_secs: self.exec_timeout,
            },
            collection: CollectionConfig {
                sample_interval_secs: self.sample_interval,
                ovn_rundir: self.ovn_rundir,
                ovn_dbdir: self.ovn_dbdir,
            },
        };

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Parse the given arguments (first item is the binary name) and resolve them.
pub fn load_config<I, T>(args: I) -> Result<ExporterConfig, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)?.resolve()
}
