//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the service routes and the `/api` group
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS, metrics)
//! - Rate limit the `/api` group
//! - Bind and drain as the main service listener

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tokio::time::Instant;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::error::not_found;
use crate::http::response;
use crate::http::state::AppState;
use crate::lifecycle::{LifecycleError, ServiceListener};
use crate::net::{self, ServingTask};
use crate::observability::metrics;
use crate::routes::{ApiRouter, API_PREFIX};
use crate::security::{cors_layer, rate_limit_middleware, RateLimiter};

pub const X_REQUEST_ID: &str = "x-request-id";

/// The main service listener.
pub struct HttpServer {
    address: String,
    router: Router,
    task: Option<ServingTask>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, state: AppState, api: ApiRouter) -> Self {
        Self {
            address: config.app.bind_address(),
            router: Self::build_router(config, state, api),
            task: None,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, state: AppState, api: ApiRouter) -> Router {
        let mut api_router = api.into_router();
        if config.rate_limit.enabled {
            tracing::info!(
                max_requests = config.rate_limit.max_requests,
                window_secs = config.rate_limit.window_secs,
                "Rate limiter enabled"
            );
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
            api_router = api_router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        Router::new()
            .route("/health", get(health))
            .nest(API_PREFIX, api_router)
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(cors_layer(&config.cors))
            .layer(DefaultBodyLimit::max(config.app.body_limit_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.app.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bound address, once serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.task.as_ref().map(ServingTask::local_addr)
    }
}

#[async_trait]
impl ServiceListener for HttpServer {
    async fn bind(&mut self) -> Result<SocketAddr, LifecycleError> {
        let listener = net::bind(&self.address).await?;
        let task = ServingTask::spawn("http", listener, self.router.clone())?;
        let address = task.local_addr();
        tracing::info!(address = %address, "HTTP server started");
        self.task = Some(task);
        Ok(address)
    }

    async fn shutdown(&mut self, deadline: Instant) -> Result<(), LifecycleError> {
        tracing::info!("Shutting down HTTP server");
        match self.task.take() {
            Some(mut task) => task.stop(deadline).await,
            None => Ok(()),
        }
    }

    async fn closed(&mut self) -> LifecycleError {
        match self.task.as_mut() {
            Some(task) => task.closed().await,
            None => std::future::pending().await,
        }
    }
}

async fn health() -> Response {
    response::success_only()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::health::ReadinessState;

    fn server(config: ServiceConfig) -> HttpServer {
        let config = Arc::new(config);
        let state = AppState::new(Arc::clone(&config), Arc::new(ReadinessState::new()));
        let api = ApiRouter::new().get("/ping", || async { response::success("pong") });
        HttpServer::new(&config, state, api)
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, Value, Option<String>) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get(X_REQUEST_ID)
            .map(|v| v.to_str().unwrap().to_owned());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), request_id)
    }

    #[tokio::test]
    async fn health_returns_success_envelope() {
        let (status, body, request_id) = call(server(ServiceConfig::default()).router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert!(request_id.is_some());
    }

    #[tokio::test]
    async fn api_routes_are_nested() {
        let mut config = ServiceConfig::default();
        config.rate_limit.enabled = false;
        let (status, body, _) = call(server(config).router(), "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "pong");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body, _) = call(server(ServiceConfig::default()).router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Cannot GET /nope", "code": 404 }));
    }

    #[tokio::test]
    async fn binds_and_drains() {
        let mut config = ServiceConfig::default();
        config.app.host = "127.0.0.1".into();
        config.app.port = 0;
        let mut server = server(config);

        let address = server.bind().await.unwrap();
        assert_eq!(server.local_addr(), Some(address));

        let body: Value = reqwest::get(format!("http://{address}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);

        server
            .shutdown(Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        assert!(server.local_addr().is_none());
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = ServiceConfig::default();
        config.app.host = "127.0.0.1".into();
        config.app.port = taken.local_addr().unwrap().port();

        let err = server(config).bind().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
