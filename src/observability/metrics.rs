//! Metrics registry and exporter self-metrics.
//!
//! # Responsibilities
//! - Own the Prometheus recorder that every registrar writes into
//! - Render the registry for the `/metrics` endpoint
//! - Track the exporter's own activity (scrapes, sampling errors, durations)
//!
//! # Metrics
//! - `ovn_exporter_build_info` (gauge): always 1, labelled with the crate version
//! - `ovn_exporter_scrapes_total` (counter): `/metrics` requests served
//! - `ovn_exporter_sample_errors_total` (counter): failed samples by collector
//! - `ovn_exporter_sample_duration_seconds` (gauge): last sample duration by collector
//!
//! # Design Decisions
//! - The recorder is never installed globally; the registry is passed around
//!   explicitly so tests get an isolated instance each
//! - Handles returned by `gauge`/`counter` are cheap atomics, safe to update
//!   while a scrape renders

use std::sync::Arc;
use std::time::Duration;

use metrics::{Counter, Gauge, Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

const BUILD_INFO: &str = "ovn_exporter_build_info";
const SCRAPES_TOTAL: &str = "ovn_exporter_scrapes_total";
const SAMPLE_ERRORS_TOTAL: &str = "ovn_exporter_sample_errors_total";
const SAMPLE_DURATION_SECONDS: &str = "ovn_exporter_sample_duration_seconds";

/// Shared handle on the process-wide metrics registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Build an empty registry and register the exporter's own metrics.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let registry = Self {
            recorder: Arc::new(recorder),
            handle,
        };
        registry.describe_self();
        registry
    }

    fn describe_self(&self) {
        self.describe_gauge(BUILD_INFO, "A metric with a constant '1' value labeled by version");
        self.describe_counter(SCRAPES_TOTAL, "Number of /metrics requests served");
        self.describe_counter(SAMPLE_ERRORS_TOTAL, "Number of failed samples per collector");
        self.describe_gauge(
            SAMPLE_DURATION_SECONDS,
            "Duration of the last sample per collector in seconds",
        );

        self.gauge(BUILD_INFO, &[("version", env!("CARGO_PKG_VERSION"))])
            .set(1.0);
        self.counter(SCRAPES_TOTAL, &[]).absolute(0);
    }

    pub fn describe_gauge(&self, name: impl Into<KeyName>, help: impl Into<SharedString>) {
        self.recorder.describe_gauge(name.into(), None, help.into());
    }

    pub fn describe_counter(&self, name: impl Into<KeyName>, help: impl Into<SharedString>) {
        self.recorder.describe_counter(name.into(), None, help.into());
    }

    /// Register (or look up) a gauge with the given labels.
    pub fn gauge(&self, name: impl Into<KeyName>, labels: &[(&'static str, &str)]) -> Gauge {
        self.recorder.register_gauge(&key(name, labels), &METADATA)
    }

    /// Register (or look up) a counter with the given labels.
    pub fn counter(&self, name: impl Into<KeyName>, labels: &[(&'static str, &str)]) -> Counter {
        self.recorder.register_counter(&key(name, labels), &METADATA)
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub(crate) fn record_scrape(&self) {
        self.counter(SCRAPES_TOTAL, &[]).increment(1);
    }

    pub(crate) fn record_sample(&self, collector: &str, elapsed: Duration, ok: bool) {
        self.gauge(SAMPLE_DURATION_SECONDS, &[("collector", collector)])
            .set(elapsed.as_secs_f64());
        if !ok {
            self.counter(SAMPLE_ERRORS_TOTAL, &[("collector", collector)])
                .increment(1);
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn key(name: impl Into<KeyName>, labels: &[(&'static str, &str)]) -> Key {
    let labels: Vec<Label> = labels
        .iter()
        .map(|(k, v)| Label::new(*k, v.to_string()))
        .collect();
    Key::from_parts(name, labels)
}
