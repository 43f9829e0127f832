//! Background sampling loop shared by every registrar.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::collectors::exec::ExecError;
use crate::collectors::Liveness;
use crate::lifecycle::SignalListener;
use crate::observability::MetricsRegistry;

/// One sample of a slice of the control plane.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Label used in logs and in the exporter's own metrics.
    fn name(&self) -> &'static str;

    /// Read current values and update the gauges the collector owns.
    async fn sample(&self) -> Result<(), ExecError>;
}

/// Drives a collector until the cancellation signal closes.
pub struct Sampler<C> {
    collector: Arc<C>,
    registry: MetricsRegistry,
    interval: Duration,
    liveness: Liveness,
}

impl<C: Collector> Sampler<C> {
    pub fn new(collector: C, registry: MetricsRegistry, interval: Duration, liveness: Liveness) -> Self {
        Self {
            collector: Arc::new(collector),
            registry,
            interval,
            liveness,
        }
    }

    /// Spawn the loop. The first sample runs right away.
    pub fn spawn(self, signal: SignalListener) -> JoinHandle<()> {
        tokio::spawn(self.run(signal))
    }

    pub async fn run(self, signal: SignalListener) {
        let name = self.collector.name();
        tracing::debug!(collector = name, interval = ?self.interval, "Sampler starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = signal.cancelled() => {
                    tracing::debug!(collector = name, "Sampler received cancellation, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.sample_once().await;
                }
            }
        }
    }

    async fn sample_once(&self) {
        let name = self.collector.name();
        if !(self.liveness)() {
            tracing::debug!(collector = name, "Subsystem not reachable, skipping sample");
            return;
        }

        let started = Instant::now();
        let result = self.collector.sample().await;
        let elapsed = started.elapsed();

        if let Err(e) = &result {
            tracing::warn!(collector = name, error = %e, "Sample failed");
        }
        self.registry.record_sample(name, elapsed, result.is_ok());
    }
}
