//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference/Arc into the application
//! ```
//!
//! # Design Decisions
//! - Config is built once in `main`; there is no global instance
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    AppConfig, CorsConfig, LifecycleConfig, LogFormat, ObservabilityConfig, ProbeConfig,
    RateLimitConfig, ServiceConfig,
};
