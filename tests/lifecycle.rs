//! End-to-end lifecycle tests against a real metrics server.

use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use tokio::sync::oneshot;

use ovn_exporter::http::{ServerError, PROMETHEUS_CONTENT_TYPE};
use ovn_exporter::lifecycle::{Coordinator, LifecycleError, RunState};
use ovn_exporter::{MetricsRegistry, MetricsServer};

mod common;

use common::{FailingRegistrar, RecordingRegistrar};

/// A stop future plus the trigger that resolves it.
fn stop_trigger() -> (oneshot::Sender<()>, impl std::future::Future<Output = ()> + Send) {
    let (tx, rx) = oneshot::channel::<()>();
    (tx, async move {
        let _ = rx.await;
    })
}

#[tokio::test]
async fn test_scrape_after_startup() {
    let port = common::free_port();
    let config = common::test_config(port);
    let registry = MetricsRegistry::new();
    let registrar = RecordingRegistrar::default();

    let coordinator = Coordinator::initialize(&config, registry.clone(), MetricsServer::new(registry))
        .with_registrar(registrar.clone());
    let (stop, stopped) = stop_trigger();
    let started = Instant::now();
    let run = tokio::spawn(coordinator.run(stopped));

    assert!(common::wait_for_listener(common::addr(port), Duration::from_secs(1)).await);
    let response = common::client()
        .get(format!("http://127.0.0.1:{port}/metrics"))
        .send()
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        PROMETHEUS_CONTENT_TYPE
    );
    let body = response.text().await.unwrap();
    assert!(!body.is_empty());
    assert!(body.contains("test_registrar_up 1"));
    assert!(body.contains("ovn_exporter_build_info"));
    assert_eq!(registrar.calls(), 1);

    // Sampling loops keep running while serving.
    let listener = registrar.listener().unwrap();
    assert!(!listener.is_cancelled());

    stop.send(()).unwrap();
    run.await.unwrap().unwrap();

    assert!(listener.is_cancelled());
    assert!(common::is_refused(common::addr(port)).await);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let port = common::free_port();
    let config = common::test_config(port);
    let registry = MetricsRegistry::new();
    let (stop, stopped) = stop_trigger();
    let run = tokio::spawn(
        Coordinator::initialize(&config, registry.clone(), MetricsServer::new(registry)).run(stopped),
    );

    assert!(common::wait_for_listener(common::addr(port), Duration::from_secs(1)).await);
    let response = common::client()
        .get(format!("http://127.0.0.1:{port}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    stop.send(()).unwrap();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_registrar_failure_never_binds() {
    let port = common::free_port();
    let config = common::test_config(port);
    let registry = MetricsRegistry::new();
    let first = RecordingRegistrar::default();

    let coordinator = Coordinator::initialize(&config, registry.clone(), MetricsServer::new(registry))
        .with_registrar(first.clone())
        .with_registrar(FailingRegistrar);

    let err = coordinator.run(std::future::pending()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Registrar { name: "failing", .. }));

    // The registrar that did start was told to stop.
    assert!(first.listener().unwrap().is_cancelled());
    assert!(common::is_refused(common::addr(port)).await);
}

#[tokio::test]
async fn test_in_flight_scrape_survives_stop() {
    let port = common::free_port();
    let mut config = common::test_config(port);
    config.timeouts.shutdown_secs = 5;
    let registry = MetricsRegistry::new();

    let slow = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "done"
        }),
    );
    let server = MetricsServer::new(registry.clone()).with_routes(slow);
    let (stop, stopped) = stop_trigger();
    let run = tokio::spawn(Coordinator::initialize(&config, registry, server).run(stopped));

    assert!(common::wait_for_listener(common::addr(port), Duration::from_secs(1)).await);
    let in_flight = tokio::spawn(
        common::client()
            .get(format!("http://127.0.0.1:{port}/slow"))
            .send(),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stop_sent = Instant::now();
    stop.send(()).unwrap();

    // New connections are refused while the slow request drains.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(common::is_refused(common::addr(port)).await);

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "done");

    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not finish within the drain timeout")
        .unwrap()
        .unwrap();
    assert!(stop_sent.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_port_in_use_fails_the_run() {
    let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = holder.local_addr().unwrap().port();
    let config = common::test_config(port);
    let registry = MetricsRegistry::new();
    let registrar = RecordingRegistrar::default();

    let coordinator = Coordinator::initialize(&config, registry.clone(), MetricsServer::new(registry))
        .with_registrar(registrar.clone());

    let err = tokio::time::timeout(Duration::from_secs(2), coordinator.run(std::future::pending()))
        .await
        .expect("bind failure did not unblock the run")
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Server(ServerError::Bind { .. })));
    assert!(registrar.listener().unwrap().is_cancelled());
    drop(holder);
}

#[tokio::test]
async fn test_shutdown_is_idempotent_and_releases_port() {
    let port = common::free_port();
    let config = common::test_config(port);
    let registry = MetricsRegistry::new();
    let mut coordinator = Coordinator::initialize(&config, registry.clone(), MetricsServer::new(registry));
    let signal = coordinator.signal();

    coordinator.start_registrars().unwrap();
    coordinator.start_server().unwrap();
    assert!(common::wait_for_listener(common::addr(port), Duration::from_secs(1)).await);

    coordinator.await_completion(async {}).await.unwrap();
    assert_eq!(coordinator.state(), RunState::Draining);
    assert!(!signal.is_cancelled());

    coordinator.shutdown().await;
    coordinator.shutdown().await;

    assert_eq!(coordinator.state(), RunState::Stopped);
    assert!(signal.is_cancelled());
    assert!(common::is_refused(common::addr(port)).await);
}
