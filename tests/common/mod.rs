//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_scaffold::lifecycle::{BoxError, HookContext, Subsystem};
use api_scaffold::ServiceConfig;
use async_trait::async_trait;
use tokio::sync::Notify;

/// Config bound to loopback on the given ports, with fast lifecycle timeouts.
pub fn test_config(app_port: u16, probe_port: u16) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.app.host = "127.0.0.1".into();
    config.app.port = app_port;
    config.probe.host = "127.0.0.1".into();
    config.probe.port = probe_port;
    config.lifecycle.start_timeout_secs = 5;
    config.lifecycle.stop_timeout_secs = 5;
    config.observability.metrics_enabled = false;
    config
}

/// Client without connection pooling, so drained listeners are observed.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Status and body of a GET, or `None` if the connection failed.
pub async fn get(client: &reqwest::Client, url: &str) -> Option<(u16, String)> {
    let response = client.get(url).send().await.ok()?;
    let status = response.status().as_u16();
    let body = response.text().await.ok()?;
    Some((status, body))
}

/// Poll `url` until it answers with `expected`, up to `timeout`.
pub async fn wait_for_status(client: &reqwest::Client, url: &str, expected: u16, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if matches!(get(client, url).await, Some((status, _)) if status == expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

pub type Log = Arc<Mutex<Vec<String>>>;

/// Subsystem that records its hooks and can be made to fail or block.
pub struct RecordingSubsystem {
    name: &'static str,
    log: Log,
    fail_start: bool,
    fail_stop: bool,
    start_gate: Option<Arc<Notify>>,
    stop_gate: Option<Arc<Notify>>,
}

impl RecordingSubsystem {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            fail_start: false,
            fail_stop: false,
            start_gate: None,
            stop_gate: None,
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Block `on_start` until the gate is notified.
    pub fn gated_start(mut self, gate: &Arc<Notify>) -> Self {
        self.start_gate = Some(Arc::clone(gate));
        self
    }

    /// Block `on_stop` until the gate is notified.
    pub fn gated_stop(mut self, gate: &Arc<Notify>) -> Self {
        self.stop_gate = Some(Arc::clone(gate));
        self
    }
}

#[async_trait]
impl Subsystem for RecordingSubsystem {
    fn name(&self) -> &str {
        self.name
    }

    async fn on_start(&mut self, _ctx: &HookContext) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(format!("start:{}", self.name));
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        if self.fail_start {
            return Err(format!("{} unavailable", self.name).into());
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &HookContext) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(format!("stop:{}", self.name));
        if let Some(gate) = &self.stop_gate {
            gate.notified().await;
        }
        if self.fail_stop {
            return Err(format!("{} did not close cleanly", self.name).into());
        }
        Ok(())
    }
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}
