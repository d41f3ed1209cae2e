//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect conflicting listeners
//! - Check that CORS entries are valid HTTP tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::IpAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "probe.port").
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An unspecified address binds every interface, so it overlaps any host.
fn is_wildcard(host: &str) -> bool {
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_unspecified())
}

fn hosts_overlap(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim()) || is_wildcard(a) || is_wildcard(b)
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app.host.trim().is_empty() {
        errors.push(ValidationError::new("app.host", "must not be empty"));
    }
    if config.app.port == 0 {
        errors.push(ValidationError::new("app.port", "must be between 1 and 65535"));
    }
    if config.app.request_timeout_secs == 0 {
        errors.push(ValidationError::new("app.request_timeout_secs", "must be greater than zero"));
    }
    if config.app.body_limit_bytes == 0 {
        errors.push(ValidationError::new("app.body_limit_bytes", "must be greater than zero"));
    }

    if config.probe.enabled {
        if config.probe.port == 0 {
            errors.push(ValidationError::new("probe.port", "must be between 1 and 65535"));
        } else if config.probe.port == config.app.port
            && hosts_overlap(&config.probe.host, &config.app.host)
        {
            errors.push(ValidationError::new(
                "probe.port",
                format!("conflicts with app.port ({})", config.app.port),
            ));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than zero"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than zero"));
        }
    }

    if config.lifecycle.start_timeout_secs == 0 {
        errors.push(ValidationError::new("lifecycle.start_timeout_secs", "must be greater than zero"));
    }
    if config.lifecycle.stop_timeout_secs == 0 {
        errors.push(ValidationError::new("lifecycle.stop_timeout_secs", "must be greater than zero"));
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not a valid filter directive", config.observability.log_level),
        ));
    }

    for origin in &config.cors.allowed_origins {
        if origin != "*" && HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("`{origin}` is not a valid origin"),
            ));
        }
    }
    for method in &config.cors.allowed_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("`{method}` is not a valid method"),
            ));
        }
    }
    for header in &config.cors.allowed_headers {
        if header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("`{header}` is not a valid header name"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = ServiceConfig::default();
        config.app.port = 0;
        config.rate_limit.max_requests = 0;
        config.lifecycle.stop_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["app.port", "rate_limit.max_requests", "lifecycle.stop_timeout_secs"]
        );
    }

    #[test]
    fn probe_port_must_not_collide_with_app_port() {
        let mut config = ServiceConfig::default();
        config.probe.port = config.app.port;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "probe.port");

        config.probe.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn wildcard_host_collides_with_any_host_on_same_port() {
        let mut config = ServiceConfig::default();
        config.app.host = "0.0.0.0".into();
        config.probe.host = "127.0.0.1".into();
        config.probe.port = config.app.port;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "probe.port");

        config.app.host = "127.0.0.1".into();
        config.probe.host = "[::]".into();
        assert!(validate_config(&config).is_err());

        config.probe.host = "127.0.0.2".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn disabled_rate_limit_skips_range_checks() {
        let mut config = ServiceConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_bad_cors_entries_and_log_level() {
        let mut config = ServiceConfig::default();
        config.cors.allowed_methods.push("NOT A METHOD".into());
        config.cors.allowed_headers.push("bad header".into());
        config.observability.log_level = "api_scaffold=verbose".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"cors.allowed_methods"));
        assert!(fields.contains(&"cors.allowed_headers"));
        assert!(fields.contains(&"observability.log_level"));
    }
}
