//! ovn-controller metrics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::coverage::CoverageCounters;
use crate::collectors::exec::{CommandRunner, ExecError};
use crate::collectors::sampler::{Collector, Sampler};
use crate::collectors::{always_live, Registrar, RegistrarContext, RegistrarError};
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

const INTEGRATION_BRIDGE: &str = "br-int";

const COVERAGE_EVENTS: &[&str] = &[
    "lflow_run",
    "physical_run",
    "pinctrl_total_pin_pkts",
    "consider_logical_flow",
];

/// `connection-status` prints a single word: `connected` or `not connected`.
pub fn parse_connection_status(output: &str) -> bool {
    output.trim() == "connected"
}

/// Flow count from `ovs-ofctl dump-aggregate`, e.g.
/// `NXST_AGGREGATE reply (xid=0x4): packet_count=0 byte_count=0 flow_count=1423`.
pub fn parse_flow_count(output: &str) -> Option<u64> {
    output
        .split_whitespace()
        .find_map(|field| field.strip_prefix("flow_count="))
        .and_then(|count| count.parse().ok())
}

struct ControllerCollector {
    exec: Arc<dyn CommandRunner>,
    registry: MetricsRegistry,
    coverage: CoverageCounters,
}

impl ControllerCollector {
    fn describe(registry: &MetricsRegistry) {
        registry.describe_gauge(
            "ovn_controller_southbound_database_connected",
            "Whether ovn-controller is connected to the Southbound database (1) or not (0)",
        );
        registry.describe_gauge(
            "ovn_controller_integration_bridge_openflow_total",
            "Number of OpenFlow flows on the integration bridge",
        );
    }
}

#[async_trait]
impl Collector for ControllerCollector {
    fn name(&self) -> &'static str {
        "ovn_controller"
    }

    async fn sample(&self) -> Result<(), ExecError> {
        let status = self
            .exec
            .run("ovn-appctl", &["-t", "ovn-controller", "connection-status"])
            .await?;
        let connected = if parse_connection_status(&status) { 1.0 } else { 0.0 };
        self.registry
            .gauge("ovn_controller_southbound_database_connected", &[])
            .set(connected);

        let aggregate = self
            .exec
            .run("ovs-ofctl", &["-t", "5", "dump-aggregate", INTEGRATION_BRIDGE])
            .await?;
        match parse_flow_count(&aggregate) {
            Some(flows) => self
                .registry
                .gauge("ovn_controller_integration_bridge_openflow_total", &[])
                .set(flows as f64),
            None => tracing::debug!(bridge = INTEGRATION_BRIDGE, "No flow_count in dump-aggregate output"),
        }

        self.coverage.update(self.exec.as_ref()).await
    }
}

/// Registers the ovn-controller metrics.
pub struct ControllerRegistrar {
    ctx: RegistrarContext,
}

impl ControllerRegistrar {
    pub fn new(ctx: RegistrarContext) -> Self {
        Self { ctx }
    }
}

impl Registrar for ControllerRegistrar {
    fn name(&self) -> &'static str {
        "ovn_controller"
    }

    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError> {
        ControllerCollector::describe(registry);
        let collector = ControllerCollector {
            exec: self.ctx.exec.clone(),
            registry: registry.clone(),
            coverage: CoverageCounters::register(
                registry,
                "ovn_controller",
                "ovn-appctl",
                "ovn-controller",
                COVERAGE_EVENTS,
            ),
        };
        // ovn-controller runs on every chassis; it is not gated on the OVN databases.
        Sampler::new(collector, registry.clone(), self.ctx.interval, always_live()).spawn(signal);
        Ok(())
    }
}
