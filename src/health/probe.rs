//! Probe endpoints and the server that exposes them.
//!
//! # Endpoints
//! - `GET /healthz`: liveness, always `200 OK`
//! - `GET /readyz`: `200 OK` when ready, `503 Service not ready yet` otherwise
//! - `GET /startupz`: `200 OK` once startup completed, `503 Service starting up` before
//! - `GET /metrics`: Prometheus exposition, when a recorder is installed
//!
//! # Design Decisions
//! - Handlers only read the readiness flags; no I/O, no locks
//! - Runs on its own port so probes answer while the main listener is
//!   down or draining

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ProbeConfig;
use crate::health::state::ReadinessState;
use crate::lifecycle::{BoxError, HookContext, Subsystem};
use crate::net::{self, ServingTask};
use crate::observability::metrics;

pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";
pub const STARTUP_PATH: &str = "/startupz";
pub const METRICS_PATH: &str = "/metrics";

const NOT_READY: &str = "Service not ready yet";
const STARTING_UP: &str = "Service starting up";

/// The three probe kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Liveness,
    Readiness,
    Startup,
}

/// Result of evaluating a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Pass,
    Fail(&'static str),
}

impl Probe {
    pub fn path(&self) -> &'static str {
        match self {
            Probe::Liveness => LIVENESS_PATH,
            Probe::Readiness => READINESS_PATH,
            Probe::Startup => STARTUP_PATH,
        }
    }

    /// Evaluate the probe against the current flags.
    pub fn check(&self, state: &ReadinessState) -> ProbeStatus {
        match self {
            Probe::Liveness => ProbeStatus::Pass,
            Probe::Readiness if state.is_ready() => ProbeStatus::Pass,
            Probe::Readiness => ProbeStatus::Fail(NOT_READY),
            Probe::Startup if state.is_startup_complete() => ProbeStatus::Pass,
            Probe::Startup => ProbeStatus::Fail(STARTING_UP),
        }
    }
}

impl IntoResponse for ProbeStatus {
    fn into_response(self) -> Response {
        match self {
            ProbeStatus::Pass => (StatusCode::OK, "OK").into_response(),
            ProbeStatus::Fail(reason) => (StatusCode::SERVICE_UNAVAILABLE, reason).into_response(),
        }
    }
}

async fn liveness(State(state): State<Arc<ReadinessState>>) -> ProbeStatus {
    Probe::Liveness.check(&state)
}

async fn readiness(State(state): State<Arc<ReadinessState>>) -> ProbeStatus {
    Probe::Readiness.check(&state)
}

async fn startup(State(state): State<Arc<ReadinessState>>) -> ProbeStatus {
    Probe::Startup.check(&state)
}

/// Build the probe router. `/metrics` is only routed when a handle is given.
pub fn probe_router(state: Arc<ReadinessState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .route(LIVENESS_PATH, get(liveness))
        .route(READINESS_PATH, get(readiness))
        .route(STARTUP_PATH, get(startup));

    if let Some(handle) = prometheus {
        router = router.route(
            METRICS_PATH,
            get(move |State(state): State<Arc<ReadinessState>>| {
                let handle = handle.clone();
                async move {
                    metrics::record_readiness(state.snapshot());
                    handle.render()
                }
            }),
        );
    }

    router.with_state(state)
}

/// Probe server, registered as the first subsystem so it is the last one
/// stopped.
pub struct ProbeServer {
    address: String,
    router: Router,
    task: Option<ServingTask>,
}

impl ProbeServer {
    pub fn new(
        config: &ProbeConfig,
        state: Arc<ReadinessState>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            address: config.bind_address(),
            router: probe_router(state, prometheus),
            task: None,
        }
    }

    /// Bound address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.task.as_ref().map(ServingTask::local_addr)
    }
}

#[async_trait]
impl Subsystem for ProbeServer {
    fn name(&self) -> &str {
        "probe"
    }

    async fn on_start(&mut self, _ctx: &HookContext) -> Result<(), BoxError> {
        let listener = net::bind(&self.address).await?;
        let task = ServingTask::spawn("probe", listener, self.router.clone())?;
        tracing::info!(
            address = %task.local_addr(),
            liveness = LIVENESS_PATH,
            readiness = READINESS_PATH,
            startup = STARTUP_PATH,
            "Probe server started"
        );
        self.task = Some(task);
        Ok(())
    }

    async fn on_stop(&mut self, ctx: &HookContext) -> Result<(), BoxError> {
        if let Some(mut task) = self.task.take() {
            task.stop(ctx.deadline()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    async fn probe(router: &Router, path: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn endpoints_follow_lifecycle_phases() {
        let state = Arc::new(ReadinessState::new());
        let router = probe_router(Arc::clone(&state), None);
        let ok = (StatusCode::OK, "OK".to_string());
        let unavailable = |body: &str| (StatusCode::SERVICE_UNAVAILABLE, body.to_string());

        // Starting.
        assert_eq!(probe(&router, "/healthz").await, ok);
        assert_eq!(probe(&router, "/readyz").await, unavailable(NOT_READY));
        assert_eq!(probe(&router, "/startupz").await, unavailable(STARTING_UP));

        // Started, listener not yet bound.
        state.mark_startup_complete();
        assert_eq!(probe(&router, "/readyz").await, unavailable(NOT_READY));
        assert_eq!(probe(&router, "/startupz").await, ok);

        // Serving.
        state.mark_ready();
        assert_eq!(probe(&router, "/healthz").await, ok);
        assert_eq!(probe(&router, "/readyz").await, ok);
        assert_eq!(probe(&router, "/startupz").await, ok);

        // Draining.
        state.begin_shutdown();
        assert_eq!(probe(&router, "/healthz").await, ok);
        assert_eq!(probe(&router, "/readyz").await, unavailable(NOT_READY));
        assert_eq!(probe(&router, "/startupz").await, ok);
    }

    #[tokio::test]
    async fn metrics_route_requires_handle() {
        let state = Arc::new(ReadinessState::new());
        let router = probe_router(state, None);
        let (status, _) = probe(&router, METRICS_PATH).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn probe_paths() {
        assert_eq!(Probe::Liveness.path(), "/healthz");
        assert_eq!(Probe::Readiness.path(), "/readyz");
        assert_eq!(Probe::Startup.path(), "/startupz");
    }

    #[tokio::test]
    async fn server_starts_and_stops_as_subsystem() {
        let config = ProbeConfig {
            enabled: true,
            host: "127.0.0.1".into(),
            port: 0,
        };
        let state = Arc::new(ReadinessState::new());
        let mut server = ProbeServer::new(&config, Arc::clone(&state), None);
        let ctx = HookContext::with_timeout(Duration::from_secs(5));

        server.on_start(&ctx).await.unwrap();
        let addr = server.local_addr().unwrap();

        let response = reqwest::get(format!("http://{addr}/startupz")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text().await.unwrap(), STARTING_UP);

        server.on_stop(&ctx).await.unwrap();
        assert!(server.local_addr().is_none());
    }
}
