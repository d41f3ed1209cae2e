//! CORS policy built from configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer. Entries that fail to parse are skipped with a
/// warning; config validation rejects them before this point.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_all(&config.allowed_origins, "origin", |origin| {
            HeaderValue::from_str(origin).ok()
        }))
    };

    let methods = parse_all(&config.allowed_methods, "method", |method| {
        method.parse::<Method>().ok()
    });
    let headers = parse_all(&config.allowed_headers, "header", |header| {
        header.parse::<HeaderName>().ok()
    });

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .max_age(Duration::from_secs(config.max_age_secs))
}

fn parse_all<T>(entries: &[String], kind: &'static str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| {
            let parsed = parse(entry);
            if parsed.is_none() {
                tracing::warn!(kind = kind, entry = %entry, "Ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}
