//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Subsystems start in order → startup complete → bind listener → ready
//!
//! Shutdown (shutdown.rs, coordinator.rs):
//!     Signal received → not ready → drain listener → stop subsystems (reverse)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     Second signal  → Forced exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: subsystems first, listener last
//! - Ordered shutdown: withdraw readiness, drain, stop
//! - Shutdown has a deadline: overrunning steps are abandoned and reported

pub mod coordinator;
pub mod error;
pub mod listener;
pub mod shutdown;
pub mod signals;
pub mod subsystem;

pub use coordinator::{Coordinator, ShutdownReport, StartOutcome};
pub use error::{HookError, LifecycleError};
pub use listener::ServiceListener;
pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::spawn_signal_handler;
pub use subsystem::{BoxError, HookContext, Subsystem, SubsystemState};
