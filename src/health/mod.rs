//! Health and readiness subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle coordinator
//!     → state.rs (startup complete / ready / shutting down flags)
//!
//! Orchestrator probes (probe.rs):
//!     GET /healthz, /readyz, /startupz
//!     → read flags from state.rs
//!     → 200 OK or 503 with a reason
//! ```
//!
//! # Design Decisions
//! - The coordinator is the only writer; probes only read
//! - Probe results derive from flags alone, never from dependency checks

pub mod probe;
pub mod state;

pub use probe::{probe_router, Probe, ProbeServer, ProbeStatus};
pub use state::{ReadinessSnapshot, ReadinessState};
