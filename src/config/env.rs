//! Environment variable overrides.
//!
//! Every variable is optional; a set variable replaces the value loaded
//! from the config file (or the default).

use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

use crate::config::schema::{LogFormat, ServiceConfig};

#[derive(Envconfig, Debug, Default)]
pub struct EnvOverrides {
    #[envconfig(from = "ENV")]
    pub env: Option<String>,

    #[envconfig(from = "HOST")]
    pub host: Option<String>,

    #[envconfig(from = "PORT")]
    pub port: Option<u16>,

    #[envconfig(from = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    #[envconfig(from = "RATE_LIMIT")]
    pub rate_limit: Option<u32>,

    #[envconfig(from = "RATE_WINDOW")]
    pub rate_window: Option<EnvDuration>,

    #[envconfig(from = "ENABLE_PROBE_SERVER")]
    pub probe_enabled: Option<bool>,

    #[envconfig(from = "PROBE_PORT")]
    pub probe_port: Option<u16>,

    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[envconfig(from = "METRICS_ENABLED")]
    pub metrics_enabled: Option<bool>,

    #[envconfig(from = "START_TIMEOUT")]
    pub start_timeout: Option<EnvDuration>,

    #[envconfig(from = "STOP_TIMEOUT")]
    pub stop_timeout: Option<EnvDuration>,

    #[envconfig(from = "READY_DELAY")]
    pub ready_delay: Option<EnvDuration>,

    /// Comma separated list of origins.
    #[envconfig(from = "CORS_ALLOWED_ORIGINS")]
    pub cors_allowed_origins: Option<String>,
}

impl EnvOverrides {
    /// Apply every set variable on top of `config`.
    ///
    /// Durations stored as whole seconds reject a sub-second remainder
    /// instead of truncating it.
    pub fn apply(self, config: &mut ServiceConfig) -> Result<(), SubSecondDuration> {
        if let Some(env) = self.env {
            config.app.env = env;
        }
        if let Some(host) = self.host {
            config.app.host = host;
        }
        if let Some(port) = self.port {
            config.app.port = port;
        }
        if let Some(enabled) = self.rate_limit_enabled {
            config.rate_limit.enabled = enabled;
        }
        if let Some(max_requests) = self.rate_limit {
            config.rate_limit.max_requests = max_requests;
        }
        if let Some(window) = self.rate_window {
            config.rate_limit.window_secs = window.whole_secs("RATE_WINDOW")?;
        }
        if let Some(enabled) = self.probe_enabled {
            config.probe.enabled = enabled;
        }
        if let Some(port) = self.probe_port {
            config.probe.port = port;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(enabled) = self.metrics_enabled {
            config.observability.metrics_enabled = enabled;
        }
        if let Some(timeout) = self.start_timeout {
            config.lifecycle.start_timeout_secs = timeout.whole_secs("START_TIMEOUT")?;
        }
        if let Some(timeout) = self.stop_timeout {
            config.lifecycle.stop_timeout_secs = timeout.whole_secs("STOP_TIMEOUT")?;
        }
        if let Some(delay) = self.ready_delay {
            config.lifecycle.ready_delay_ms = u64::try_from(delay.0.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some(origins) = self.cors_allowed_origins {
            config.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }
}

/// A duration variable whose target field only holds whole seconds.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{var} must be a whole number of seconds, got {value:?}")]
pub struct SubSecondDuration {
    pub var: &'static str,
    pub value: Duration,
}

/// A duration read from the environment: anything `humantime` accepts
/// (`500ms`, `30s`, `1m 30s`, `2h`), or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvDuration(pub Duration);

impl EnvDuration {
    fn whole_secs(self, var: &'static str) -> Result<u64, SubSecondDuration> {
        if self.0.subsec_nanos() != 0 {
            return Err(SubSecondDuration { var, value: self.0 });
        }
        Ok(self.0.as_secs())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration `{0}`")]
pub struct ParseEnvDurationError(String);

impl FromStr for EnvDuration {
    type Err = ParseEnvDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(secs) = trimmed.parse::<u64>() {
            return Ok(EnvDuration(Duration::from_secs(secs)));
        }
        humantime::parse_duration(trimmed)
            .map(EnvDuration)
            .map_err(|_| ParseEnvDurationError(s.to_owned()))
    }
}
