//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Main HTTP listener and request handling.
    pub app: AppConfig,

    /// Cross-origin resource sharing policy.
    pub cors: CorsConfig,

    /// Per-client rate limiting for the API group.
    pub rate_limit: RateLimitConfig,

    /// Health probe server.
    pub probe: ProbeConfig,

    /// Startup and shutdown deadlines.
    pub lifecycle: LifecycleConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Main application listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name (e.g., "development", "production").
    pub env: String,

    /// Bind host for the main listener.
    pub host: String,

    /// Bind port for the main listener.
    pub port: u16,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

impl AppConfig {
    /// `host:port` string for binding the main listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            body_limit_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. A single `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed request methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers.
    pub allowed_headers: Vec<String>,

    /// How long browsers may cache a preflight response, in seconds.
    pub max_age_secs: u64,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: ["origin", "content-type", "accept", "authorization"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_age_secs: 3600,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per window per client IP.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
        }
    }
}

/// Health probe server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Run the probe server.
    pub enabled: bool,

    /// Bind host for the probe listener.
    pub host: String,

    /// Bind port for the probe listener.
    pub port: u16,
}

impl ProbeConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

/// Lifecycle deadlines.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Budget for the whole start phase, in seconds.
    pub start_timeout_secs: u64,

    /// Budget for the whole shutdown sequence, in seconds.
    pub stop_timeout_secs: u64,

    /// Settle delay between listener bind and marking the service ready,
    /// in milliseconds. Zero marks ready on bind confirmation.
    pub ready_delay_ms: u64,
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 15,
            stop_timeout_secs: 15,
            ready_delay_ms: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "console" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g., "info" or "api_scaffold=debug,info").
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on the probe server.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
