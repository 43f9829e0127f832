//! Configuration schema definitions.
//!
//! This module defines the resolved configuration for the exporter.
//! Values are produced by [`crate::config::loader`] from flags and environment
//! and are immutable afterwards.

use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Listener configuration (host and port of the metrics endpoint).
    pub listener: ListenerConfig,

    /// Log level or `EnvFilter` directive.
    pub log_level: String,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Collection settings shared by the registrars.
    pub collection: CollectionConfig,
}

impl ExporterConfig {
    /// Address the metrics endpoint binds to, `host:port`.
    pub fn bind_address(&self) -> String {
        self.listener.bind_address()
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            log_level: "debug".to_string(),
            timeouts: TimeoutConfig::default(),
            collection: CollectionConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind, kept as given on the command line.
    pub port: String,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        bind_address(&self.host, &self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "9310".to_string(),
        }
    }
}

/// Join a host and a port into a bind address.
///
/// No resolution or validation happens here; `"::"` and `"9310"` give `":::9310"`
/// exactly as the strings are concatenated.
pub fn bind_address(host: &str, port: &str) -> String {
    format!("{}:{}", host, port)
}

/// Timeout configuration for shutdown and command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Upper bound for draining in-flight scrapes on shutdown, in seconds.
    pub shutdown_secs: u64,

    /// Upper bound for a single OVS/OVN command, in seconds.
    pub exec_secs: u64,
}

impl TimeoutConfig {
    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }

    pub fn exec(&self) -> Duration {
        Duration::from_secs(self.exec_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shutdown_secs: 5,
            exec_secs: 5,
        }
    }
}

/// Where and how often the registrars sample the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Seconds between two samples of the same collector.
    pub sample_interval_secs: u64,

    /// Directory holding the OVN control sockets (`ovnnb_db.ctl`, ...).
    pub ovn_rundir: PathBuf,

    /// Directory holding the OVN database files (`ovnnb_db.db`, ...).
    pub ovn_dbdir: PathBuf,
}

impl CollectionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 30,
            ovn_rundir: PathBuf::from("/var/run/ovn"),
            ovn_dbdir: PathBuf::from("/var/lib/ovn"),
        }
    }
}
