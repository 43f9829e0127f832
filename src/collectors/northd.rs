//! ovn-northd metrics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::coverage::CoverageCounters;
use crate::collectors::exec::{CommandRunner, ExecError};
use crate::collectors::sampler::{Collector, Sampler};
use crate::collectors::{Registrar, RegistrarContext, RegistrarError};
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

const COVERAGE_EVENTS: &[&str] = &["txn_success", "txn_error", "txn_aborted", "txn_try_again"];

/// HA state of an ovn-northd instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NorthdStatus {
    Standby,
    Active,
    Paused,
}

impl NorthdStatus {
    /// Gauge value: standby 0, active 1, paused 2.
    pub fn as_gauge(self) -> f64 {
        match self {
            NorthdStatus::Standby => 0.0,
            NorthdStatus::Active => 1.0,
            NorthdStatus::Paused => 2.0,
        }
    }
}

/// Parse `ovn-appctl -t ovn-northd status`, e.g. `Status: active`.
pub fn parse_status(output: &str) -> Option<NorthdStatus> {
    let value = output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Status:"))?
        .trim();
    match value {
        "active" => Some(NorthdStatus::Active),
        "standby" => Some(NorthdStatus::Standby),
        "paused" => Some(NorthdStatus::Paused),
        _ => None,
    }
}

struct NorthdCollector {
    exec: Arc<dyn CommandRunner>,
    registry: MetricsRegistry,
    coverage: CoverageCounters,
}

#[async_trait]
impl Collector for NorthdCollector {
    fn name(&self) -> &'static str {
        "ovn_northd"
    }

    async fn sample(&self) -> Result<(), ExecError> {
        let output = self
            .exec
            .run("ovn-appctl", &["-t", "ovn-northd", "status"])
            .await?;
        match parse_status(&output) {
            Some(status) => self
                .registry
                .gauge("ovn_northd_status", &[])
                .set(status.as_gauge()),
            None => tracing::debug!(output = output.trim(), "Unrecognized ovn-northd status"),
        }

        self.coverage.update(self.exec.as_ref()).await
    }
}

/// Registers the ovn-northd metrics.
pub struct NorthdRegistrar {
    ctx: RegistrarContext,
}

impl NorthdRegistrar {
    pub fn new(ctx: RegistrarContext) -> Self {
        Self { ctx }
    }
}

impl Registrar for NorthdRegistrar {
    fn name(&self) -> &'static str {
        "ovn_northd"
    }

    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError> {
        registry.describe_gauge(
            "ovn_northd_status",
            "ovn-northd HA status: standby (0), active (1) or paused (2)",
        );
        let collector = NorthdCollector {
            exec: self.ctx.exec.clone(),
            registry: registry.clone(),
            coverage: CoverageCounters::register(
                registry,
                "ovn_northd",
                "ovn-appctl",
                "ovn-northd",
                COVERAGE_EVENTS,
            ),
        };
        Sampler::new(collector, registry.clone(), self.ctx.interval, self.ctx.liveness.clone()).spawn(signal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("Status: active\n"), Some(NorthdStatus::Active));
        assert_eq!(parse_status("Status: standby\n"), Some(NorthdStatus::Standby));
        assert_eq!(parse_status("Status: paused\n"), Some(NorthdStatus::Paused));
        assert_eq!(parse_status("Status: unknown\n"), None);
        assert_eq!(parse_status(""), None);
    }

    #[test]
    fn test_status_gauge_values() {
        assert_eq!(NorthdStatus::Standby.as_gauge(), 0.0);
        assert_eq!(NorthdStatus::Active.as_gauge(), 1.0);
        assert_eq!(NorthdStatus::Paused.as_gauge(), 2.0);
    }
}
