//! End-to-end lifecycle tests against real sockets.

use std::sync::Arc;
use std::time::Duration;

use api_scaffold::lifecycle::{LifecycleError, Shutdown};
use api_scaffold::Application;
use tokio::sync::Notify;

mod common;

use common::{entries, get, test_config, wait_for_status, Log, RecordingSubsystem};

#[tokio::test]
async fn probes_follow_every_lifecycle_phase() {
    let config = test_config(28301, 28302);
    let probe = "http://127.0.0.1:28302";
    let app_url = "http://127.0.0.1:28301/health";
    let client = common::client();

    let log = Log::default();
    let start_gate = Arc::new(Notify::new());
    let stop_gate = Arc::new(Notify::new());
    let app = Application::builder(config)
        .subsystem(RecordingSubsystem::new("database", &log).gated_start(&start_gate))
        .subsystem(RecordingSubsystem::new("cache", &log).gated_stop(&stop_gate))
        .build();
    let readiness = app.readiness();

    let shutdown = Shutdown::new(Duration::from_secs(5));
    let run = tokio::spawn(app.run(shutdown.subscribe()));

    // Starting: probe server is up, database still connecting.
    assert!(wait_for_status(&client, &format!("{probe}/healthz"), 200, Duration::from_secs(5)).await);
    assert_eq!(
        get(&client, &format!("{probe}/startupz")).await,
        Some((503, "Service starting up".to_string()))
    );
    assert_eq!(
        get(&client, &format!("{probe}/readyz")).await,
        Some((503, "Service not ready yet".to_string()))
    );
    assert!(get(&client, app_url).await.is_none());

    // Serving.
    start_gate.notify_one();
    assert!(wait_for_status(&client, &format!("{probe}/readyz"), 200, Duration::from_secs(5)).await);
    assert_eq!(get(&client, &format!("{probe}/readyz")).await, Some((200, "OK".to_string())));
    assert_eq!(get(&client, &format!("{probe}/startupz")).await, Some((200, "OK".to_string())));
    assert_eq!(get(&client, app_url).await.map(|(status, _)| status), Some(200));

    // Draining: cache is blocked in its stop hook.
    shutdown.trigger();
    assert!(wait_for_status(&client, &format!("{probe}/readyz"), 503, Duration::from_secs(5)).await);
    assert!(readiness.is_shutting_down());
    while !entries(&log).contains(&"stop:cache".to_string()) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(get(&client, &format!("{probe}/healthz")).await, Some((200, "OK".to_string())));
    assert_eq!(get(&client, &format!("{probe}/startupz")).await, Some((200, "OK".to_string())));
    assert!(get(&client, app_url).await.is_none());

    stop_gate.notify_one();
    let report = run.await.unwrap().unwrap();
    assert!(report.is_clean());
    assert_eq!(
        entries(&log),
        vec!["start:database", "start:cache", "stop:cache", "stop:database"]
    );

    // Stopped: probe server went down last.
    assert!(get(&client, &format!("{probe}/healthz")).await.is_none());
}

#[tokio::test]
async fn failing_subsystem_aborts_startup() {
    let config = test_config(28311, 28312);
    let client = common::client();
    let log = Log::default();

    let app = Application::builder(config)
        .subsystem(RecordingSubsystem::new("database", &log))
        .subsystem(RecordingSubsystem::new("broker", &log).failing_start())
        .subsystem(RecordingSubsystem::new("cache", &log))
        .build();
    let readiness = app.readiness();

    let shutdown = Shutdown::new(Duration::from_secs(5));
    let err = app.run(shutdown.subscribe()).await.unwrap_err();

    match &err {
        LifecycleError::StartupFailure { subsystem, .. } => assert_eq!(subsystem, "broker"),
        other => panic!("expected startup failure, got {other}"),
    }
    assert!(err.is_fatal());
    assert_eq!(entries(&log), vec!["start:database", "start:broker"]);
    assert!(!readiness.is_startup_complete());
    assert!(!readiness.is_ready());

    // Main listener was never bound.
    assert!(get(&client, "http://127.0.0.1:28311/health").await.is_none());
}

#[tokio::test]
async fn stop_failures_are_reported_not_fatal() {
    let config = test_config(28321, 28322);
    let client = common::client();
    let log = Log::default();

    let app = Application::builder(config)
        .subsystem(RecordingSubsystem::new("database", &log))
        .subsystem(RecordingSubsystem::new("kafka", &log).failing_stop())
        .subsystem(RecordingSubsystem::new("redis", &log))
        .build();

    let shutdown = Shutdown::new(Duration::from_secs(5));
    let run = tokio::spawn(app.run(shutdown.subscribe()));
    assert!(
        wait_for_status(&client, "http://127.0.0.1:28322/readyz", 200, Duration::from_secs(5)).await
    );

    shutdown.trigger();
    let report = run.await.unwrap().unwrap();

    assert_eq!(report.errors().len(), 1);
    assert!(matches!(
        &report.errors()[0],
        LifecycleError::ShutdownFailure { subsystem, .. } if subsystem == "kafka"
    ));
    assert_eq!(
        entries(&log),
        vec![
            "start:database",
            "start:kafka",
            "start:redis",
            "stop:redis",
            "stop:kafka",
            "stop:database",
        ]
    );
}

#[tokio::test]
async fn occupied_port_is_a_fatal_bind_failure() {
    let _taken = tokio::net::TcpListener::bind("127.0.0.1:28331").await.unwrap();
    let mut config = test_config(28331, 28332);
    config.probe.enabled = false;

    let app = Application::builder(config).build();
    let readiness = app.readiness();
    let shutdown = Shutdown::new(Duration::from_secs(5));

    let err = app.run(shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ListenerBindFailure { .. }));
    assert!(readiness.is_startup_complete());
    assert!(!readiness.is_ready());
}
