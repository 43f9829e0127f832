//! Execution shim for the OVS/OVN command line tools.
//!
//! # Responsibilities
//! - Resolve the required binaries once at startup (`set_exec`)
//! - Run a resolved binary with a timeout and return its stdout
//!
//! # Design Decisions
//! - Collectors only see the [`CommandRunner`] trait so tests can script output
//! - A missing binary fails startup, a failing command only fails one sample

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Binaries every registrar relies on.
pub const REQUIRED_BINARIES: &[&str] = &["ovs-vsctl", "ovs-appctl", "ovs-ofctl", "ovn-appctl"];

/// Error type for command execution.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0} not found in PATH")]
    NotFound(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not finish within {after:?}")]
    Timeout { program: String, after: Duration },
}

/// Runs an OVS/OVN tool and returns what it printed on stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecError>;
}

/// Real runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct OvsExec {
    binaries: HashMap<&'static str, PathBuf>,
    timeout: Duration,
}

impl OvsExec {
    /// Resolve [`REQUIRED_BINARIES`] on the process `PATH`.
    pub fn set_exec(timeout: Duration) -> Result<Self, ExecError> {
        let path = std::env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(&path, timeout)
    }

    /// Resolve [`REQUIRED_BINARIES`] on an explicit `PATH`-style list.
    pub fn with_search_path(search_path: &OsStr, timeout: Duration) -> Result<Self, ExecError> {
        let mut binaries = HashMap::new();
        for name in REQUIRED_BINARIES {
            let resolved = lookup(name, search_path)
                .ok_or_else(|| ExecError::NotFound(name.to_string()))?;
            tracing::debug!(binary = name, path = %resolved.display(), "Resolved binary");
            binaries.insert(*name, resolved);
        }
        Ok(Self { binaries, timeout })
    }

    pub fn binary(&self, name: &str) -> Option<&Path> {
        self.binaries.get(name).map(PathBuf::as_path)
    }
}

#[async_trait]
impl CommandRunner for OvsExec {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, ExecError> {
        let path = self
            .binary(program)
            .ok_or_else(|| ExecError::NotFound(program.to_string()))?;

        let child = Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(output) => output.map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(ExecError::Timeout {
                    program: program.to_string(),
                    after: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(ExecError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn lookup(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
