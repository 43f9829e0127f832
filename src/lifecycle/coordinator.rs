//! Process lifecycle coordinator.
//!
//! # Responsibilities
//! - Own the cancellation signal, the completion barrier and the server
//! - Start every registrar before the server accepts a connection
//! - Wait for the serving task, then shut down in order
//!
//! # Ordering
//! ```text
//! start_registrars ──▶ start_server ──▶ await_completion ──▶ shutdown
//!   (any error: close                      (stop requested:      close signal,
//!    signal, Stopped,                       drain server)        stop server
//!    never bind)                                                 (no-op if drained)
//! ```
//!
//! The cancellation signal closes only once the server has stopped serving,
//! so no sampling loop is told to stop while a scrape can still read it.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::collectors::{Registrar, RegistrarError};
use crate::config::ExporterConfig;
use crate::http::{ServerError, ServerLifecycle};
use crate::lifecycle::barrier::CompletionBarrier;
use crate::lifecycle::shutdown::{CancellationSignal, SignalListener};
use crate::lifecycle::state::RunState;
use crate::observability::MetricsRegistry;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A registrar failed to start; the server was never started.
    #[error("registrar {name} failed to start: {source}")]
    Registrar {
        name: &'static str,
        #[source]
        source: RegistrarError,
    },
    /// An operation was called out of order.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: RunState, to: RunState },
    /// The serving task failed on its own (bind or accept error).
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Drives one run of the exporter.
pub struct Coordinator<S> {
    bind_address: String,
    shutdown_timeout: Duration,
    registry: MetricsRegistry,
    registrars: Vec<Box<dyn Registrar>>,
    server: S,
    signal: CancellationSignal,
    barrier: CompletionBarrier,
    state: RunState,
    fatal: Option<ServerError>,
}

impl<S: ServerLifecycle> Coordinator<S> {
    /// Create a coordinator with a fresh, open signal and an empty barrier.
    pub fn initialize(config: &ExporterConfig, registry: MetricsRegistry, server: S) -> Self {
        Self {
            bind_address: config.bind_address(),
            shutdown_timeout: config.timeouts.shutdown(),
            registry,
            registrars: Vec::new(),
            server,
            signal: CancellationSignal::new(),
            barrier: CompletionBarrier::new(),
            state: RunState::Created,
            fatal: None,
        }
    }

    pub fn with_registrar(mut self, registrar: impl Registrar + 'static) -> Self {
        self.registrars.push(Box::new(registrar));
        self
    }

    pub fn with_registrars(mut self, registrars: Vec<Box<dyn Registrar>>) -> Self {
        self.registrars.extend(registrars);
        self
    }

    /// A listener on the run's cancellation signal.
    pub fn signal(&self) -> SignalListener {
        self.signal.listener()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    fn advance(&mut self, next: RunState) -> Result<(), LifecycleError> {
        if !self.state.can_advance_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
        Ok(())
    }

    /// Invoke every registrar in order. Stops at the first failure.
    pub fn start_registrars(&mut self) -> Result<(), LifecycleError> {
        self.advance(RunState::RegistrarsStarting)?;

        for registrar in &self.registrars {
            let name = registrar.name();
            if let Err(source) = registrar.register(&self.registry, self.signal.listener()) {
                error!(registrar = name, error = %source, "Registrar failed to start");
                // Loops of registrars that already started must not outlive the run.
                self.signal.close();
                self.state = RunState::Stopped;
                return Err(LifecycleError::Registrar { name, source });
            }
            info!(registrar = name, "Registrar started");
        }
        Ok(())
    }

    /// Start the server in the background. Returns immediately.
    pub fn start_server(&mut self) -> Result<(), LifecycleError> {
        self.advance(RunState::Serving)?;
        info!(address = %self.bind_address, "Starting metrics server");
        self.server.start(&self.bind_address, &self.barrier);
        Ok(())
    }

    /// Block until the serving task completes.
    ///
    /// If `stop` resolves first the server is asked to drain, and the wait
    /// continues until the serving task has actually finished.
    pub async fn await_completion<F>(&mut self, stop: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()> + Send,
    {
        let stop_requested = tokio::select! {
            _ = self.barrier.wait() => false,
            _ = stop => true,
        };

        self.advance(RunState::Draining)?;
        if stop_requested {
            info!(timeout = ?self.shutdown_timeout, "Stop requested, draining metrics server");
        } else {
            info!("Metrics server stopped on its own");
        }

        // Joins the serving task, which also reports a bind/accept failure.
        let stopped = self.server.stop(self.shutdown_timeout).await;
        self.record_server_result(stopped);
        self.barrier.wait().await;
        Ok(())
    }

    /// Close the cancellation signal, then release the server.
    ///
    /// Safe to call more than once and from any state.
    pub async fn shutdown(&mut self) {
        if self.signal.close() {
            info!("Cancellation signal closed");
        }

        let stopped = self.server.stop(self.shutdown_timeout).await;
        self.record_server_result(stopped);

        if self.state.can_advance_to(RunState::Stopped) {
            self.state = RunState::Stopped;
            info!("Shutdown complete");
        }
    }

    /// Run start to finish. Resolves when the server has stopped and the
    /// signal is closed.
    pub async fn run<F>(mut self, stop: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()> + Send,
    {
        self.start_registrars()?;
        self.start_server()?;

        let completed = self.await_completion(stop).await;
        self.shutdown().await;
        completed?;

        match self.fatal.take() {
            Some(e) => Err(LifecycleError::Server(e)),
            None => Ok(()),
        }
    }

    fn record_server_result(&mut self, result: Result<(), ServerError>) {
        match result {
            Ok(()) => {}
            // Already logged by the serving task.
            Err(e) if e.is_fatal() => {
                self.fatal.get_or_insert(e);
            }
            Err(e) => error!(error = %e, "Metrics server did not shut down cleanly"),
        }
    }
}
