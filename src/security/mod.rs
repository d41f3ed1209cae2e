//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → cors.rs (preflight answers, origin checks)
//!     → rate_limit.rs (per-client fixed window, /api only)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Both layers are built from config at router construction
//! - Rate limiter state is shared across connections via DashMap

pub mod cors;
pub mod rate_limit;

pub use cors::cors_layer;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
