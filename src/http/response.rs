//! Standard JSON response envelope.
//!
//! # Shape
//! ```text
//! {
//!   "success": true,
//!   "data": { ... },                                   (omitted when absent)
//!   "error": { "code", "message", "details" },         (omitted when absent)
//!   "meta": { "page", "page_size", "total_pages", "total_count" }
//! }
//! ```
//!
//! # Design Decisions
//! - Builders mirror the envelope fields; helpers cover the common statuses
//! - Zero-valued pagination fields are omitted

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope wrapping every API payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetaInfo {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_pages: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_count: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl<T> ApiResponse<T> {
    /// A successful response with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            meta: None,
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach error information; marks the response unsuccessful.
    pub fn with_error(
        mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        self.success = false;
        self.error = Some(ErrorInfo {
            code: code.into(),
            message: message.into(),
            details,
        });
        self
    }

    pub fn with_meta(mut self, page: u64, page_size: u64, total_pages: u64, total_count: u64) -> Self {
        self.meta = Some(MetaInfo {
            page,
            page_size,
            total_pages,
            total_count,
        });
        self
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Render with the given status.
    pub fn send(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        self.send(StatusCode::OK)
    }
}

pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::ok().with_data(data).send(StatusCode::OK)
}

pub fn success_only() -> Response {
    ApiResponse::<Value>::ok().send(StatusCode::OK)
}

pub fn success_with_meta<T: Serialize>(
    data: T,
    page: u64,
    page_size: u64,
    total_pages: u64,
    total_count: u64,
) -> Response {
    ApiResponse::ok()
        .with_data(data)
        .with_meta(page, page_size, total_pages, total_count)
        .send(StatusCode::OK)
}

pub fn created<T: Serialize>(data: T) -> Response {
    ApiResponse::ok().with_data(data).send(StatusCode::CREATED)
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Error envelope with an explicit status.
pub fn error(status: StatusCode, code: &str, message: &str, details: Option<Value>) -> Response {
    ApiResponse::<Value>::ok()
        .with_error(code, message, details)
        .send(status)
}

pub fn bad_request(code: &str, message: &str, details: Option<Value>) -> Response {
    error(StatusCode::BAD_REQUEST, code, message, details)
}

pub fn not_found(code: &str, message: &str, details: Option<Value>) -> Response {
    error(StatusCode::NOT_FOUND, code, message, details)
}

pub fn unauthorized(message: &str) -> Response {
    error(StatusCode::UNAUTHORIZED, "unauthorized", message, None)
}

pub fn forbidden(message: &str) -> Response {
    error(StatusCode::FORBIDDEN, "forbidden", message, None)
}

/// Generic 500; the cause is logged, never returned to the client.
pub fn internal_error(err: &dyn std::error::Error) -> Response {
    tracing::error!(error = %err, "Internal server error");
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal server error occurred",
        None,
    )
}
