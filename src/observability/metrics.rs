//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (readiness, subsystem starts, requests)
//! - Install the Prometheus recorder rendered by the probe server
//! - Track per-request metrics through an axum middleware
//!
//! # Metrics
//! - `lifecycle_ready` (gauge): 1 when serving traffic
//! - `lifecycle_startup_complete` (gauge): 1 once subsystems started
//! - `lifecycle_shutting_down` (gauge): 1 during shutdown
//! - `lifecycle_subsystem_start_seconds` (histogram): start hook duration by subsystem
//! - `lifecycle_subsystem_failures_total` (counter): failed hooks by subsystem, phase
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_rate_limited_total` (counter): requests rejected by the rate limiter
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup
//! - Path label uses the matched route template to bound cardinality

use std::time::Duration;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tokio::time::Instant;

use crate::health::state::ReadinessSnapshot;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)?
        .install_recorder()
}

pub fn record_readiness(snapshot: ReadinessSnapshot) {
    metrics::gauge!("lifecycle_ready").set(flag(snapshot.ready));
    metrics::gauge!("lifecycle_startup_complete").set(flag(snapshot.startup_complete));
    metrics::gauge!("lifecycle_shutting_down").set(flag(snapshot.shutting_down));
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

pub fn record_subsystem_start(subsystem: &str, elapsed: Duration) {
    metrics::histogram!(
        "lifecycle_subsystem_start_seconds",
        "subsystem" => subsystem.to_owned()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_subsystem_failure(subsystem: &str, phase: &'static str) {
    metrics::counter!(
        "lifecycle_subsystem_failures_total",
        "subsystem" => subsystem.to_owned(),
        "phase" => phase
    )
    .increment(1);
}

pub fn record_request(method: &str, path: &str, status: u16, started: Instant) {
    let labels = [
        ("method", method.to_owned()),
        ("path", path.to_owned()),
        ("status", status.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("http_rate_limited_total").increment(1);
}

/// Middleware recording count and latency for every request.
pub async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => "unmatched".to_owned(),
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    record_request(method.as_str(), &path, response.status().as_u16(), started);
    response
}
