//! HTTP API Service Scaffold Library

// Core subsystems
pub mod app;
pub mod config;
pub mod http;
pub mod net;
pub mod routes;

// Service lifecycle
pub mod health;
pub mod lifecycle;

// Cross-cutting concerns
pub mod observability;
pub mod security;

// Data
pub mod models;

pub use app::{Application, ApplicationBuilder};
pub use config::schema::ServiceConfig;
pub use health::ReadinessState;
pub use http::HttpServer;
pub use lifecycle::{Coordinator, LifecycleError, Shutdown, Subsystem};
pub use routes::{ApiRouter, Controller};
