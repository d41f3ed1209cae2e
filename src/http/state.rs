use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::health::ReadinessState;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub readiness: Arc<ReadinessState>,
}

impl AppState {
    pub fn new(config: Arc<ServiceConfig>, readiness: Arc<ReadinessState>) -> Self {
        Self { config, readiness }
    }
}
