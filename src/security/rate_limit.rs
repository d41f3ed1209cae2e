//! Per-client fixed-window rate limiting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Windows are pruned once the table grows past this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Request count for one client in the current window.
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    fn try_acquire(&mut self, now: Instant, length: Duration, max: u32) -> Decision {
        if now.duration_since(self.started) >= length {
            self.started = now;
            self.count = 0;
        }

        let reset_after = length.saturating_sub(now.duration_since(self.started));
        if self.count < max {
            self.count += 1;
            Decision::Allowed {
                remaining: max - self.count,
            }
        } else {
            Decision::Limited { reset_after }
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { reset_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Fixed-window limiter keyed by client address.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.max_requests,
            window: config.window(),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request for `key`.
    pub fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        if self.windows.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }

        let mut window = self
            .windows
            .entry(key.to_owned())
            .or_insert_with(|| Window::new(now));
        window.try_acquire(now, self.window, self.max_requests)
    }

    /// Drop windows that have already expired.
    fn prune(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.window);
        tracing::debug!(
            before = before,
            after = self.windows.len(),
            "Pruned expired rate limit windows"
        );
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Middleware rejecting clients over their window budget with `429`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned());

    match limiter.check(&client) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limiter.max_requests()));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Decision::Limited { reset_after } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            metrics::record_rate_limited();

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Rate limit exceeded" })),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limiter.max_requests()));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(reset_after.as_secs().max(1)),
            );
            response
        }
    }
}
