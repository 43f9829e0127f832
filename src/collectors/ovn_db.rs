//! OVN Northbound/Southbound database metrics.
//!
//! # Responsibilities
//! - Probe each ovsdb-server through its control socket (`memory/show`)
//! - Report the on-disk database size
//! - Report raft state (`cluster/status`) when the database is clustered
//!
//! # Design Decisions
//! - A standalone database has no cluster status; that case is not an error
//! - `ovn_db_up` goes to 0 when the control socket does not answer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::exec::{CommandRunner, ExecError};
use crate::collectors::sampler::{Collector, Sampler};
use crate::collectors::{Registrar, RegistrarContext, RegistrarError};
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

const SERVER_ROLES: &[&str] = &["leader", "follower", "candidate"];

/// One OVN database served by its own ovsdb-server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvnDatabase {
    /// Schema name, used as the `db_name` label.
    pub name: &'static str,
    /// File stem of the control socket and database file.
    pub stem: &'static str,
}

pub const NORTHBOUND: OvnDatabase = OvnDatabase {
    name: "OVN_Northbound",
    stem: "ovnnb_db",
};

pub const SOUTHBOUND: OvnDatabase = OvnDatabase {
    name: "OVN_Southbound",
    stem: "ovnsb_db",
};

impl OvnDatabase {
    pub fn control_socket(&self, rundir: &Path) -> PathBuf {
        rundir.join(format!("{}.ctl", self.stem))
    }

    pub fn db_file(&self, dbdir: &Path) -> PathBuf {
        dbdir.join(format!("{}.db", self.stem))
    }
}

/// Numbers from `memory/show`, e.g.
/// `atoms:2155 cells:2798 monitors:4 raft-log:3 sessions:3 txn-history:7`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub monitors: u64,
    pub sessions: u64,
}

pub fn parse_memory_show(output: &str) -> MemoryStats {
    let mut stats = MemoryStats::default();
    for pair in output.split_whitespace() {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let Ok(value) = value.parse() else {
            continue;
        };
        match key {
            "monitors" => stats.monitors = value,
            "sessions" => stats.sessions = value,
            _ => {}
        }
    }
    stats
}

/// The parts of `cluster/status <db>` that are exported.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClusterStatus {
    pub role: String,
    pub status: String,
    pub term: u64,
    pub election_timer: u64,
    pub uncommitted_entries: u64,
    pub unapplied_entries: u64,
    pub servers: u64,
}

/// Parse `ovs-appctl -t <ctl> cluster/status <db>`.
///
/// ```text
/// Name: OVN_Northbound
/// Status: cluster member
/// Role: leader
/// Term: 4
/// Election timer: 1000
/// Entries not yet committed: 0
/// Entries not yet applied: 0
/// Servers:
///     a8d3 (a8d3 at ssl:10.0.0.1:6643) (self) next_index=3 match_index=29
///     b5f3 (b5f3 at ssl:10.0.0.2:6643) next_index=30 match_index=29
/// ```
pub fn parse_cluster_status(output: &str) -> ClusterStatus {
    let mut status = ClusterStatus::default();
    let mut in_servers = false;

    for line in output.lines() {
        if in_servers {
            if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
                status.servers += 1;
                continue;
            }
            in_servers = false;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Role" => status.role = value.to_string(),
            "Status" => status.status = value.to_string(),
            "Term" => status.term = value.parse().unwrap_or(0),
            "Election timer" => status.election_timer = value.parse().unwrap_or(0),
            "Entries not yet committed" => status.uncommitted_entries = value.parse().unwrap_or(0),
            "Entries not yet applied" => status.unapplied_entries = value.parse().unwrap_or(0),
            "Servers" => in_servers = true,
            _ => {}
        }
    }

    status
}

struct OvnDbCollector {
    exec: Arc<dyn CommandRunner>,
    registry: MetricsRegistry,
    databases: Vec<OvnDatabase>,
    rundir: PathBuf,
    dbdir: PathBuf,
}

impl OvnDbCollector {
    fn describe(registry: &MetricsRegistry) {
        registry.describe_gauge("ovn_db_up", "Whether the database answers on its control socket (1) or not (0)");
        registry.describe_gauge("ovn_db_db_size_bytes", "The size of the database file associated with the OVN DB component");
        registry.describe_gauge("ovn_db_monitors", "Number of OVSDB monitors on the database");
        registry.describe_gauge("ovn_db_sessions", "Number of OVSDB sessions on the database");
        registry.describe_gauge(
            "ovn_db_cluster_server_role",
            "A metric with a constant '1' value for the current raft role of this server",
        );
        registry.describe_gauge(
            "ovn_db_cluster_server_status",
            "Whether this server is a cluster member (1) or not (0)",
        );
        registry.describe_gauge("ovn_db_cluster_term", "The current raft term known by this server");
        registry.describe_gauge("ovn_db_cluster_election_timer", "The raft election timer in milliseconds");
        registry.describe_gauge("ovn_db_cluster_uncommitted_entries", "Number of raft entries not yet committed");
        registry.describe_gauge("ovn_db_cluster_unapplied_entries", "Number of raft entries not yet applied");
        registry.describe_gauge("ovn_db_cluster_servers_total", "Number of servers in the raft cluster");
    }

    async fn sample_database(&self, db: OvnDatabase) -> Result<(), ExecError> {
        let labels = [("db_name", db.name)];
        let ctl = db.control_socket(&self.rundir);
        let ctl = ctl.to_string_lossy();

        match tokio::fs::metadata(db.db_file(&self.dbdir)).await {
            Ok(meta) => self
                .registry
                .gauge("ovn_db_db_size_bytes", &labels)
                .set(meta.len() as f64),
            Err(e) => tracing::debug!(db = db.name, error = %e, "Database file not readable"),
        }

        let memory = match self.exec.run("ovs-appctl", &["-t", &ctl, "memory/show"]).await {
            Ok(output) => parse_memory_show(&output),
            Err(e) => {
                self.registry.gauge("ovn_db_up", &labels).set(0.0);
                return Err(e);
            }
        };
        self.registry.gauge("ovn_db_up", &labels).set(1.0);
        self.registry
            .gauge("ovn_db_monitors", &labels)
            .set(memory.monitors as f64);
        self.registry
            .gauge("ovn_db_sessions", &labels)
            .set(memory.sessions as f64);

        match self
            .exec
            .run("ovs-appctl", &["-t", &ctl, "cluster/status", db.name])
            .await
        {
            Ok(output) => self.record_cluster(db, &parse_cluster_status(&output)),
            Err(e) => tracing::debug!(db = db.name, error = %e, "No cluster status, assuming standalone"),
        }
        Ok(())
    }

    fn record_cluster(&self, db: OvnDatabase, cluster: &ClusterStatus) {
        let labels = [("db_name", db.name)];
        for role in SERVER_ROLES {
            let value = if cluster.role == *role { 1.0 } else { 0.0 };
            self.registry
                .gauge("ovn_db_cluster_server_role", &[("db_name", db.name), ("server_role", *role)])
                .set(value);
        }

        let member = if cluster.status == "cluster member" { 1.0 } else { 0.0 };
        self.registry
            .gauge("ovn_db_cluster_server_status", &labels)
            .set(member);

        let set = |name: &'static str, value: u64| {
            self.registry.gauge(name, &labels).set(value as f64);
        };
        set("ovn_db_cluster_term", cluster.term);
        set("ovn_db_cluster_election_timer", cluster.election_timer);
        set("ovn_db_cluster_uncommitted_entries", cluster.uncommitted_entries);
        set("ovn_db_cluster_unapplied_entries", cluster.unapplied_entries);
        set("ovn_db_cluster_servers_total", cluster.servers);
    }
}

#[async_trait]
impl Collector for OvnDbCollector {
    fn name(&self) -> &'static str {
        "ovn_db"
    }

    async fn sample(&self) -> Result<(), ExecError> {
        // Sample every database even if one of them is down.
        let mut first_error = None;
        for db in &self.databases {
            if let Err(e) = self.sample_database(*db).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Registers the Northbound and Southbound database metrics.
pub struct OvnDbRegistrar {
    ctx: RegistrarContext,
    rundir: PathBuf,
    dbdir: PathBuf,
}

impl OvnDbRegistrar {
    pub fn new(ctx: RegistrarContext, rundir: PathBuf, dbdir: PathBuf) -> Self {
        Self { ctx, rundir, dbdir }
    }
}

impl Registrar for OvnDbRegistrar {
    fn name(&self) -> &'static str {
        "ovn_db"
    }

    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError> {
        OvnDbCollector::describe(registry);
        let collector = OvnDbCollector {
            exec: self.ctx.exec.clone(),
            registry: registry.clone(),
            databases: vec![NORTHBOUND, SOUTHBOUND],
            rundir: self.rundir.clone(),
            dbdir: self.dbdir.clone(),
        };
        Sampler::new(collector, registry.clone(), self.ctx.interval, self.ctx.liveness.clone()).spawn(signal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLUSTER_STATUS: &str = "\
a8d3
Name: OVN_Northbound
Cluster ID: 9c4d (9c4d2a1e-0ab3-4a0e-8e2a-1b3c4d5e6f70)
Server ID: a8d3 (a8d3b1c2-3d4e-5f60-7182-93a4b5c6d7e8)
Address: ssl:10.0.0.1:6643
Status: cluster member
Role: leader
Term: 4
Leader: self
Vote: self

Last Election started 1234 ms ago, reason: timeout
Election timer: 1000
Log: [2, 30]
Entries not yet committed: 1
Entries not yet applied: 2
Connections: ->0000 ->b5f3 <-b5f3 <-0000
Disconnections: 0
Servers:
    a8d3 (a8d3 at ssl:10.0.0.1:6643) (self) next_index=3 match_index=29
    b5f3 (b5f3 at ssl:10.0.0.2:6643) next_index=30 match_index=29 last msg 120 ms ago
    c7e1 (c7e1 at ssl:10.0.0.3:6643) next_index=30 match_index=29 last msg 118 ms ago
";

    #[test]
    fn test_parse_cluster_status() {
        let status = parse_cluster_status(CLUSTER_STATUS);
        assert_eq!(
            status,
            ClusterStatus {
                role: "leader".into(),
                status: "cluster member".into(),
                term: 4,
                election_timer: 1000,
                uncommitted_entries: 1,
                unapplied_entries: 2,
                servers: 3,
            }
        );
    }

    #[test]
    fn test_parse_memory_show() {
        let stats = parse_memory_show("atoms:2155 cells:2798 monitors:4 raft-log:3 sessions:3 txn-history:7\n");
        assert_eq!(stats, MemoryStats { monitors: 4, sessions: 3 });
        assert_eq!(parse_memory_show("cells:x"), MemoryStats::default());
    }

    #[test]
    fn test_paths() {
        let rundir = Path::new("/var/run/ovn");
        assert_eq!(NORTHBOUND.control_socket(rundir), Path::new("/var/run/ovn/ovnnb_db.ctl"));
        assert_eq!(SOUTHBOUND.db_file(Path::new("/var/lib/ovn")), Path::new("/var/lib/ovn/ovnsb_db.db"));
    }
}
