//! Open vSwitch metrics: bridges, ports and kernel datapaths.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::exec::{CommandRunner, ExecError};
use crate::collectors::sampler::{Collector, Sampler};
use crate::collectors::{always_live, Registrar, RegistrarContext, RegistrarError};
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

const OVS_TIMEOUT: &str = "--timeout=5";

/// Counters of one datapath as printed by `ovs-appctl dpctl/show`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatapathStats {
    pub name: String,
    pub lookups_hit: u64,
    pub lookups_missed: u64,
    pub lookups_lost: u64,
    pub flows: u64,
    pub masks_total: u64,
    pub ports: u64,
}

/// Parse `ovs-appctl dpctl/show`.
///
/// ```text
/// system@ovs-system:
///   lookups: hit:1234 missed:56 lost:0
///   flows: 12
///   masks: hit:3456 total:4 hit/pkt:2.70
///   port 0: ovs-system (internal)
///   port 1: br-int (internal)
/// ```
pub fn parse_dpctl_show(output: &str) -> Vec<DatapathStats> {
    let mut datapaths: Vec<DatapathStats> = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            if let Some(name) = line.trim_end().strip_suffix(':') {
                datapaths.push(DatapathStats {
                    name: name.to_string(),
                    ..Default::default()
                });
            }
            continue;
        }

        let Some(current) = datapaths.last_mut() else {
            continue;
        };
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("lookups:") {
            for (key, value) in key_values(rest) {
                match key {
                    "hit" => current.lookups_hit = value,
                    "missed" => current.lookups_missed = value,
                    "lost" => current.lookups_lost = value,
                    _ => {}
                }
            }
        } else if let Some(rest) = line.strip_prefix("flows:") {
            current.flows = rest.trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("masks:") {
            if let Some((_, total)) = key_values(rest).find(|(k, _)| *k == "total") {
                current.masks_total = total;
            }
        } else if line.starts_with("port ") {
            current.ports += 1;
        }
    }

    datapaths
}

/// `hit:1 missed:2` style pairs; values that are not integers are skipped.
fn key_values(s: &str) -> impl Iterator<Item = (&str, u64)> {
    s.split_whitespace().filter_map(|pair| {
        let (key, value) = pair.split_once(':')?;
        Some((key, value.parse().ok()?))
    })
}

/// Version from the first line of `ovs-vsctl --version`, e.g.
/// `ovs-vsctl (Open vSwitch) 3.1.0`.
pub fn parse_version(output: &str) -> Option<&str> {
    output.lines().next()?.split_whitespace().last()
}

/// Non-empty lines, used for `list-br` and `list-ports`.
pub fn parse_names(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

struct OvsCollector {
    exec: Arc<dyn CommandRunner>,
    registry: MetricsRegistry,
}

impl OvsCollector {
    fn describe(registry: &MetricsRegistry) {
        registry.describe_gauge(
            "ovs_build_info",
            "A metric with a constant '1' value labeled by ovs version",
        );
        registry.describe_gauge("ovs_vswitchd_bridge_total", "Number of bridges");
        registry.describe_gauge("ovs_vswitchd_bridge_ports_total", "Number of ports per bridge");
        registry.describe_gauge("ovs_vswitchd_dp_flows_total", "Number of flows in the datapath");
        registry.describe_gauge(
            "ovs_vswitchd_dp_lookups_hit",
            "Number of incoming packets that matched an existing datapath flow",
        );
        registry.describe_gauge(
            "ovs_vswitchd_dp_lookups_missed",
            "Number of incoming packets that did not match a datapath flow",
        );
        registry.describe_gauge(
            "ovs_vswitchd_dp_lookups_lost",
            "Number of packets dropped before reaching userspace",
        );
        registry.describe_gauge("ovs_vswitchd_dp_masks_total", "Number of masks in the datapath");
        registry.describe_gauge("ovs_vswitchd_dp_ports_total", "Number of ports in the datapath");
    }

    async fn sample_bridges(&self) -> Result<(), ExecError> {
        let output = self.exec.run("ovs-vsctl", &[OVS_TIMEOUT, "list-br"]).await?;
        let bridges = parse_names(&output);
        self.registry
            .gauge("ovs_vswitchd_bridge_total", &[])
            .set(bridges.len() as f64);

        for bridge in bridges {
            let ports = self
                .exec
                .run("ovs-vsctl", &[OVS_TIMEOUT, "list-ports", bridge])
                .await?;
            self.registry
                .gauge("ovs_vswitchd_bridge_ports_total", &[("bridge", bridge)])
                .set(parse_names(&ports).len() as f64);
        }
        Ok(())
    }

    async fn sample_datapaths(&self) -> Result<(), ExecError> {
        let output = self.exec.run("ovs-appctl", &[OVS_TIMEOUT, "dpctl/show"]).await?;

        for dp in parse_dpctl_show(&output) {
            let labels = [("datapath", dp.name.as_str())];
            let set = |name: &'static str, value: u64| {
                self.registry.gauge(name, &labels).set(value as f64);
            };
            set("ovs_vswitchd_dp_flows_total", dp.flows);
            set("ovs_vswitchd_dp_lookups_hit", dp.lookups_hit);
            set("ovs_vswitchd_dp_lookups_missed", dp.lookups_missed);
            set("ovs_vswitchd_dp_lookups_lost", dp.lookups_lost);
            set("ovs_vswitchd_dp_masks_total", dp.masks_total);
            set("ovs_vswitchd_dp_ports_total", dp.ports);
        }
        Ok(())
    }
}

#[async_trait]
impl Collector for OvsCollector {
    fn name(&self) -> &'static str {
        "ovs"
    }

    async fn sample(&self) -> Result<(), ExecError> {
        let version = self.exec.run("ovs-vsctl", &["--version"]).await?;
        if let Some(version) = parse_version(&version) {
            self.registry
                .gauge("ovs_build_info", &[("version", version)])
                .set(1.0);
        }

        self.sample_bridges().await?;
        self.sample_datapaths().await
    }
}

/// Registers the standalone Open vSwitch metrics.
pub struct OvsRegistrar {
    ctx: RegistrarContext,
}

impl OvsRegistrar {
    pub fn new(ctx: RegistrarContext) -> Self {
        Self { ctx }
    }
}

impl Registrar for OvsRegistrar {
    fn name(&self) -> &'static str {
        "ovs"
    }

    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError> {
        OvsCollector::describe(registry);
        let collector = OvsCollector {
            exec: self.ctx.exec.clone(),
            registry: registry.clone(),
        };
        Sampler::new(collector, registry.clone(), self.ctx.interval, always_live()).spawn(signal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DPCTL_SHOW: &str = "\
system@ovs-system:
  lookups: hit:1234 missed:56 lost:0
  flows: 12
  masks: hit:3456 total:4 hit/pkt:2.70
  port 0: ovs-system (internal)
  port 1: br-int (internal)
  port 2: genev_sys_6081 (geneve: packet_type=ptap)
netdev@ovs-netdev:
  lookups: hit:7 missed:1 lost:2
  flows: 0
  masks: hit:0 total:0 hit/pkt:0.00
  port 0: ovs-netdev (tap)
";

    #[test]
    fn test_parse_dpctl_show() {
        let dps = parse_dpctl_show(DPCTL_SHOW);
        assert_eq!(dps.len(), 2);

        assert_eq!(
            dps[0],
            DatapathStats {
                name: "system@ovs-system".into(),
                lookups_hit: 1234,
                lookups_missed: 56,
                lookups_lost: 0,
                flows: 12,
                masks_total: 4,
                ports: 3,
            }
        );
        assert_eq!(dps[1].name, "netdev@ovs-netdev");
        assert_eq!(dps[1].lookups_lost, 2);
        assert_eq!(dps[1].ports, 1);
    }

    #[test]
    fn test_parse_dpctl_show_empty() {
        assert!(parse_dpctl_show("").is_empty());
        assert!(parse_dpctl_show("  flows: 3\n").is_empty());
    }

    #[test]
    fn test_parse_version() {
        let out = "ovs-vsctl (Open vSwitch) 3.1.0\nDB Schema 8.3.1\n";
        assert_eq!(parse_version(out), Some("3.1.0"));
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names("br-int\nbr-ex\n\n"), vec!["br-int", "br-ex"]);
        assert!(parse_names("\n").is_empty());
    }
}
