//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;

use ovn_exporter::collectors::{CommandRunner, ExecError, Registrar, RegistrarError};
use ovn_exporter::config::ExporterConfig;
use ovn_exporter::lifecycle::SignalListener;
use ovn_exporter::MetricsRegistry;

/// Reserve a free local port. The port is released before returning.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config bound to `127.0.0.1:<port>` with a short sample interval.
pub fn test_config(port: u16) -> ExporterConfig {
    let mut config = ExporterConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = port.to_string();
    config.collection.sample_interval_secs = 1;
    config
}

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// HTTP client that never reuses connections, so every request is a new connect.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// Poll until something accepts on `addr`, or give up after `within`.
pub async fn wait_for_listener(addr: SocketAddr, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub async fn is_refused(addr: SocketAddr) -> bool {
    TcpStream::connect(addr).await.is_err()
}

/// Command runner that answers from a script instead of running anything.
///
/// Keys are the program followed by its arguments, joined by spaces.
#[derive(Default)]
pub struct FakeRunner {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecError> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(command.clone());

        self.outputs
            .get(&command)
            .cloned()
            .ok_or_else(|| ExecError::Failed {
                program: program.to_string(),
                status: "exit status: 1".into(),
                stderr: format!("no scripted output for `{command}`"),
            })
    }
}

/// Registrar that records calls and sets one gauge.
#[derive(Clone, Default)]
pub struct RecordingRegistrar {
    pub calls: Arc<AtomicUsize>,
    pub listener: Arc<Mutex<Option<SignalListener>>>,
}

impl RecordingRegistrar {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn listener(&self) -> Option<SignalListener> {
        self.listener.lock().unwrap().clone()
    }
}

impl Registrar for RecordingRegistrar {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn register(&self, registry: &MetricsRegistry, signal: SignalListener) -> Result<(), RegistrarError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        registry.describe_gauge("test_registrar_up", "Set by the recording registrar");
        registry.gauge("test_registrar_up", &[]).set(1.0);
        *self.listener.lock().unwrap() = Some(signal);
        Ok(())
    }
}

/// Registrar whose startup always fails.
pub struct FailingRegistrar;

impl Registrar for FailingRegistrar {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn register(&self, _registry: &MetricsRegistry, _signal: SignalListener) -> Result<(), RegistrarError> {
        Err(ExecError::NotFound("ovs-vsctl".into()).into())
    }
}
