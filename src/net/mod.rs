//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured address
//!     → listener.rs (bind, fatal on failure)
//!     → ServingTask (axum::serve on a background task)
//!     → stop(deadline): graceful drain, abort when the deadline passes
//! ```
//!
//! # Design Decisions
//! - Both the probe server and the main HTTP server go through this layer
//! - Each serving task is tracked for graceful shutdown

pub mod listener;

pub use listener::{bind, ServingTask};
