//! Application bootstrap.
//!
//! # Data Flow
//! ```text
//! ServiceConfig
//!     → ApplicationBuilder (subsystems, controllers, metrics handle)
//!     → build(): ReadinessState, Coordinator, ProbeServer (first), HttpServer
//!     → run(shutdown): Coordinator::run until the shutdown signal fires
//! ```
//!
//! # Design Decisions
//! - Every dependency is wired here explicitly; nothing is global
//! - The probe server is registered before any caller subsystem, so it is
//!   answering before they start and after they stop

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ServiceConfig;
use crate::health::{ProbeServer, ReadinessState};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{Coordinator, LifecycleError, ShutdownListener, ShutdownReport, Subsystem};
use crate::routes::{ApiRouter, Controller};

pub struct ApplicationBuilder {
    config: ServiceConfig,
    subsystems: Vec<Box<dyn Subsystem>>,
    controllers: Vec<Box<dyn Controller>>,
    prometheus: Option<PrometheusHandle>,
}

impl ApplicationBuilder {
    /// Add a subsystem. Subsystems start in the order they are added.
    pub fn subsystem(mut self, subsystem: impl Subsystem + 'static) -> Self {
        self.subsystems.push(Box::new(subsystem));
        self
    }

    /// Add a controller whose routes are mounted under `/api`.
    pub fn controller(mut self, controller: impl Controller + 'static) -> Self {
        self.controllers.push(Box::new(controller));
        self
    }

    /// Expose `/metrics` on the probe server.
    pub fn metrics(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn build(self) -> Application {
        let config = Arc::new(self.config);
        let readiness = Arc::new(ReadinessState::new());
        let mut coordinator = Coordinator::new(Arc::clone(&readiness), config.lifecycle.clone());

        if config.probe.enabled {
            coordinator.register(ProbeServer::new(
                &config.probe,
                Arc::clone(&readiness),
                self.prometheus,
            ));
        } else {
            tracing::info!("Probe server disabled");
        }
        for subsystem in self.subsystems {
            coordinator.register_boxed(subsystem);
        }

        let api = self
            .controllers
            .iter()
            .fold(ApiRouter::new(), |api, controller| {
                tracing::debug!(controller = %controller.name(), "Registering controller");
                controller.register(api)
            });
        api.log_routes();

        let state = AppState::new(Arc::clone(&config), Arc::clone(&readiness));
        let server = HttpServer::new(&config, state, api);

        Application {
            coordinator,
            server,
            readiness,
        }
    }
}

/// A fully wired service, ready to run.
pub struct Application {
    coordinator: Coordinator,
    server: HttpServer,
    readiness: Arc<ReadinessState>,
}

impl Application {
    pub fn builder(config: ServiceConfig) -> ApplicationBuilder {
        ApplicationBuilder {
            config,
            subsystems: Vec::new(),
            controllers: Vec::new(),
            prometheus: None,
        }
    }

    pub fn readiness(&self) -> Arc<ReadinessState> {
        Arc::clone(&self.readiness)
    }

    /// The main listener's router, for in-process testing.
    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Start, serve until `shutdown` fires, then stop.
    pub async fn run(self, shutdown: ShutdownListener) -> Result<ShutdownReport, LifecycleError> {
        self.coordinator.run(self.server, shutdown).await
    }
}
