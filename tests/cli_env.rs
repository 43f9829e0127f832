//! Environment bindings of the command line.
//!
//! Kept in its own test binary: it mutates the process environment.

use ovn_exporter::config::{load_config, ENV_PREFIX};

#[test]
fn test_env_overrides_default_and_flag_overrides_env() {
    let var = format!("{ENV_PREFIX}_PORT");
    std::env::set_var(&var, "9999");
    std::env::set_var(format!("{ENV_PREFIX}_SAMPLE_INTERVAL"), "10");

    let config = load_config(["ovn-exporter"]).unwrap();
    assert_eq!(config.listener.port, "9999");
    assert_eq!(config.listener.host, "0.0.0.0");
    assert_eq!(config.collection.sample_interval_secs, 10);
    assert_eq!(config.bind_address(), "0.0.0.0:9999");

    let config = load_config(["ovn-exporter", "--port", "9400"]).unwrap();
    assert_eq!(config.listener.port, "9400");

    std::env::remove_var(&var);
    let config = load_config(["ovn-exporter"]).unwrap();
    assert_eq!(config.listener.port, "9310");
}
