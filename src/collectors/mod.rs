//! Metric registrars for the OVN/OVS control plane.
//!
//! # Data Flow
//! ```text
//! Coordinator
//!     → Registrar::register(registry, signal listener)
//!         → describe + register metric families
//!         → Sampler (one task per registrar)
//!             → Collector::sample (exec.rs runs ovs-vsctl, ovs-appctl, ...)
//!             → gauges/counters in the shared registry
//!         ← stops when the cancellation signal closes
//! ```
//!
//! # Registrars
//! - ovs.rs: Open vSwitch bridges and datapaths
//! - ovn_db.rs: OVN Northbound/Southbound ovsdb-server instances
//! - controller.rs: ovn-controller
//! - northd.rs: ovn-northd
//!
//! # Design Decisions
//! - `register` never blocks: sampling happens in the spawned loop
//! - Sampling failures are logged and counted, never fatal
//! - A liveness predicate can gate sampling; the default always says yes

pub mod controller;
pub mod coverage;
pub mod exec;
pub mod northd;
pub mod ovn_db;
pub mod ovs;
pub mod sampler;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ExporterConfig;
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

pub use controller::ControllerRegistrar;
pub use exec::{CommandRunner, ExecError, OvsExec};
pub use northd::NorthdRegistrar;
pub use ovn_db::OvnDbRegistrar;
pub use ovs::OvsRegistrar;
pub use sampler::{Collector, Sampler};

/// Reports whether the subsystem a registrar measures is reachable.
pub type Liveness = Arc<dyn Fn() -> bool + Send + Sync>;

/// Liveness predicate that always reports the subsystem as reachable.
pub fn always_live() -> Liveness {
    Arc::new(|| true)
}

/// Error type for registrar startup.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// The execution shim could not be set up.
    #[error("execution shim unavailable: {0}")]
    Exec(#[from] ExecError),
    /// Anything else that prevents the registrar from starting.
    #[error("{0}")]
    Setup(String),
}

/// Registers one family of metrics and keeps it updated.
pub trait Registrar: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register metric descriptors and start background sampling.
    ///
    /// Must return promptly; sampling stops when `signal` closes.
    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError>;
}

/// Settings every built-in registrar shares.
#[derive(Clone)]
pub struct RegistrarContext {
    pub exec: Arc<dyn CommandRunner>,
    pub interval: Duration,
    pub liveness: Liveness,
}

impl RegistrarContext {
    pub fn new(exec: Arc<dyn CommandRunner>, interval: Duration) -> Self {
        Self {
            exec,
            interval,
            liveness: always_live(),
        }
    }

    pub fn with_liveness(mut self, liveness: Liveness) -> Self {
        self.liveness = liveness;
        self
    }
}

/// The four registrars the exporter runs, in start order.
pub fn default_registrars(ctx: &RegistrarContext, config: &ExporterConfig) -> Vec<Box<dyn Registrar>> {
    vec![
        Box::new(OvsRegistrar::new(ctx.clone())),
        Box::new(OvnDbRegistrar::new(
            ctx.clone(),
            config.collection.ovn_rundir.clone(),
            config.collection.ovn_dbdir.clone(),
        )),
        Box::new(ControllerRegistrar::new(ctx.clone())),
        Box::new(NorthdRegistrar::new(ctx.clone())),
    ]
}
