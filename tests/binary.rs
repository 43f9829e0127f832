//! Exit codes of the `ovn-exporter` binary.

use std::process::Command;

mod common;

#[test]
fn test_invalid_port_exits_one() {
    let status = Command::new(env!("CARGO_BIN_EXE_ovn-exporter"))
        .args(["--port", "not-a-port"])
        .env_remove("RUST_LOG")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_ovn-exporter"))
        .arg("--help")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--shutdown-timeout"));
}

#[tokio::test]
async fn test_missing_ovs_tools_exit_one_without_binding() {
    let empty = std::env::temp_dir().join(format!("ovn-exporter-empty-path-{}", std::process::id()));
    std::fs::create_dir_all(&empty).unwrap();
    let port = common::free_port();

    let status = Command::new(env!("CARGO_BIN_EXE_ovn-exporter"))
        .args(["--host", "127.0.0.1", "--port", &port.to_string(), "--loglevel", "info"])
        .env("PATH", &empty)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    assert!(common::is_refused(common::addr(port)).await);
    std::fs::remove_dir_all(&empty).unwrap_or_default();
}
