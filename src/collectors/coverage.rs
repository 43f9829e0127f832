//! `coverage/show` parsing and the counters built from it.
//!
//! Every OVS/OVN daemon answers `coverage/show` with one line per event:
//!
//! ```text
//! Event coverage, avg rate over last: 5 seconds, last minute, last hour,  hash=2bc6a4a4:
//! lflow_run                  0.0/sec     0.050/sec        0.0206/sec   total: 74
//! physical_run               0.0/sec     0.033/sec        0.0136/sec   total: 49
//! 104 events never hit
//! ```

use std::collections::HashMap;

use metrics::Counter;

use crate::collectors::exec::{CommandRunner, ExecError};
use crate::observability::MetricsRegistry;

/// Parse `coverage/show` output into `event -> total`.
pub fn parse_coverage(output: &str) -> HashMap<String, u64> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let event = fields.next()?;
            let fields: Vec<&str> = fields.collect();
            match fields.as_slice() {
                [.., "total:", total] => Some((event.to_string(), total.parse().ok()?)),
                _ => None,
            }
        })
        .collect()
}

/// Exposes a fixed set of coverage events of one daemon as counters named
/// `<prefix>_<event>_total`.
pub struct CoverageCounters {
    program: &'static str,
    target: String,
    counters: Vec<(&'static str, Counter)>,
}

impl CoverageCounters {
    /// `program` is the appctl binary, `target` the daemon name or control socket.
    pub fn register(
        registry: &MetricsRegistry,
        prefix: &str,
        program: &'static str,
        target: impl Into<String>,
        events: &[&'static str],
    ) -> Self {
        let counters = events
            .iter()
            .map(|event| {
                let name = format!("{}_{}_total", prefix, event);
                registry.describe_counter(
                    name.clone(),
                    format!("Number of times the '{}' coverage event was hit", event),
                );
                (*event, registry.counter(name, &[]))
            })
            .collect();

        Self {
            program,
            target: target.into(),
            counters,
        }
    }

    /// Query the daemon and move each counter to the reported total.
    pub async fn update(&self, exec: &dyn CommandRunner) -> Result<(), ExecError> {
        let output = exec
            .run(self.program, &["-t", self.target.as_str(), "coverage/show"])
            .await?;
        let totals = parse_coverage(&output);

        for (event, counter) in &self.counters {
            // Events never hit are not listed.
            counter.absolute(totals.get(*event).copied().unwrap_or(0));
        }
        Ok(())
    }
}
