//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use envconfig::Envconfig;

use crate::config::env::{EnvOverrides, SubSecondDuration};
use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    Env(#[from] envconfig::Error),

    #[error("Environment error: {0}")]
    Override(#[from] SubSecondDuration),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration: file (if any), then environment
/// overrides, then validation of the merged result.
pub fn resolve_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let overrides = EnvOverrides::init_from_env()?;
    resolve_with(path, overrides)
}

/// [`resolve_config`] with explicit overrides instead of the process
/// environment.
pub fn resolve_with(
    path: Option<&Path>,
    overrides: EnvOverrides,
) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };

    overrides.apply(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = ?path, "Configuration resolved");
    Ok(config)
}
