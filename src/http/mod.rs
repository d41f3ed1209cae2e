//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::ServingTask)
//!     → server.rs (request ID, trace, timeout, body limit, CORS, metrics)
//!     → /health, or /api group (rate limited) built by routes::ApiRouter
//!     → validation.rs extractors (typed, validated payloads)
//!     → handler
//!     → response.rs envelope, or error.rs body
//!     → Send to client
//! ```

pub mod error;
pub mod response;
pub mod server;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use response::ApiResponse;
pub use server::{HttpServer, X_REQUEST_ID};
pub use state::AppState;
pub use validation::{Rule, Validate, ValidatedJson, ValidatedPath, ValidatedQuery};
