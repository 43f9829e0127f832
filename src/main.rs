//! OVN/OVS Prometheus exporter.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     OVN EXPORTER                     │
//!                 │                                                      │
//!   flags + env ──┼─▶ config ──▶ lifecycle::Coordinator                  │
//!                 │                 │                                    │
//!                 │                 ├─▶ collectors (ovs, ovn_db,         │
//!                 │                 │     controller, northd)            │
//!                 │                 │       │  ovs-vsctl / ovs-appctl /  │
//!                 │                 │       │  ovs-ofctl / ovn-appctl    │
//!                 │                 │       ▼                            │
//!                 │                 │   MetricsRegistry ◀──┐             │
//!                 │                 │                      │             │
//!   Prometheus ◀──┼─────────────────┴─▶ http (GET /metrics)┘             │
//!                 │                                                      │
//!   SIGINT/TERM ──┼─▶ drain http ──▶ close signal ──▶ exit               │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use ovn_exporter::collectors::{default_registrars, OvsExec, RegistrarContext, RegistrarError};
use ovn_exporter::config::Cli;
use ovn_exporter::lifecycle::{signals, Coordinator};
use ovn_exporter::observability::logging::init_tracing;
use ovn_exporter::{ExporterError, MetricsRegistry, MetricsServer, VERSION};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExporterError::Config(e)) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "ovn-exporter exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    let config = cli.resolve()?;
    init_tracing(&config.log_level)?;

    tracing::info!(
        version = VERSION,
        bind_address = %config.bind_address(),
        log_level = %config.log_level,
        shutdown_timeout_secs = config.timeouts.shutdown_secs,
        sample_interval_secs = config.collection.sample_interval_secs,
        exec_timeout_secs = config.timeouts.exec_secs,
        ovn_rundir = %config.collection.ovn_rundir.display(),
        ovn_dbdir = %config.collection.ovn_dbdir.display(),
        "Configuration loaded"
    );

    let exec = OvsExec::set_exec(config.timeouts.exec()).map_err(|e| {
        tracing::error!(error = %e, "Failed to set up the OVS/OVN execution shim");
        RegistrarError::from(e)
    })?;

    let registry = MetricsRegistry::new();
    let ctx = RegistrarContext::new(Arc::new(exec), config.collection.sample_interval());
    let server = MetricsServer::new(registry.clone());

    Coordinator::initialize(&config, registry, server)
        .with_registrars(default_registrars(&ctx, &config))
        .run(signals::shutdown_signal())
        .await?;

    Ok(())
}
