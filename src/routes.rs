//! API route registration.
//!
//! # Data Flow
//! ```text
//! Controller::register(ApiRouter)
//!     → ApiRouter::{get, post, put, patch, delete}
//!     → routes added to the /api router, endpoint recorded
//!     → log_routes() prints the sorted listing at startup
//! ```

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{self, MethodRouter};
use axum::Router;

use crate::http::AppState;

pub const API_PREFIX: &str = "/api";

/// A registered `(method, path)` pair. `path` includes the `/api` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

/// A group of routes mounted under `/api`.
pub trait Controller: Send + Sync {
    fn name(&self) -> &str;

    /// Add this controller's routes.
    fn register(&self, api: ApiRouter) -> ApiRouter;
}

/// Router for the `/api` group that remembers what it registered.
pub struct ApiRouter {
    router: Router<AppState>,
    endpoints: Vec<Endpoint>,
}

impl Default for ApiRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRouter {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    /// Register `method_router` at `path` (relative to `/api`), recording
    /// `methods` in the endpoint listing.
    pub fn route(mut self, path: &str, methods: &[Method], method_router: MethodRouter<AppState>) -> Self {
        let full_path = if path == "/" {
            API_PREFIX.to_owned()
        } else {
            format!("{API_PREFIX}{path}")
        };
        for method in methods {
            tracing::debug!(method = %method, path = %full_path, "Route registered");
            self.endpoints.push(Endpoint {
                method: method.clone(),
                path: full_path.clone(),
            });
        }
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(path, &[Method::GET], routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(path, &[Method::POST], routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(path, &[Method::PUT], routing::put(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(path, &[Method::PATCH], routing::patch(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(path, &[Method::DELETE], routing::delete(handler))
    }

    /// Registered endpoints sorted by method then path; HEAD is left out.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<_> = self
            .endpoints
            .iter()
            .filter(|endpoint| endpoint.method != Method::HEAD)
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| {
            (a.method.as_str(), a.path.as_str()).cmp(&(b.method.as_str(), b.path.as_str()))
        });
        endpoints.dedup();
        endpoints
    }

    /// One line per endpoint with methods padded to equal width.
    pub fn format_routes(&self) -> Vec<String> {
        let endpoints = self.endpoints();
        let width = endpoints
            .iter()
            .map(|endpoint| endpoint.method.as_str().len())
            .max()
            .unwrap_or(0);
        endpoints
            .iter()
            .map(|endpoint| format!("  {:<width$}  │  {}", endpoint.method.as_str(), endpoint.path))
            .collect()
    }

    pub fn log_routes(&self) {
        let lines = self.format_routes();
        if lines.is_empty() {
            tracing::info!("No API routes found");
            return;
        }
        tracing::info!(count = lines.len(), "API endpoints");
        for line in lines {
            tracing::info!("{line}");
        }
    }

    pub fn into_router(self) -> Router<AppState> {
        self.router
    }
}
