//! Service readiness state.
//!
//! # Flags
//! - startup complete: set once, never cleared
//! - ready: service accepts external traffic
//! - shutting down: one-way; forces ready off
//!
//! # State Transitions
//! ```text
//! mark_startup_complete: startup ← true
//! mark_ready:            ready ← true    (rejected while shutting down)
//! mark_not_ready:        ready ← false
//! begin_shutdown:        shutting_down ← true, ready ← false (single step)
//! ```
//!
//! # Design Decisions
//! - All three flags live in one atomic byte, so `begin_shutdown` clears
//!   ready in the same write that sets shutting down
//! - Readers do a single load; no locks anywhere

use std::sync::atomic::{AtomicU8, Ordering};

const STARTUP_COMPLETE: u8 = 0b001;
const READY: u8 = 0b010;
const SHUTTING_DOWN: u8 = 0b100;

/// Readiness flags shared between the lifecycle coordinator and the probe
/// endpoints.
#[derive(Debug, Default)]
pub struct ReadinessState {
    flags: AtomicU8,
}

/// A consistent view of all flags taken from one atomic load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadinessSnapshot {
    pub startup_complete: bool,
    pub ready: bool,
    pub shutting_down: bool,
}

impl ReadinessState {
    /// Create a state with every flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that all required subsystems initialized. Idempotent.
    pub fn mark_startup_complete(&self) {
        let previous = self.flags.fetch_or(STARTUP_COMPLETE, Ordering::AcqRel);
        if previous & STARTUP_COMPLETE == 0 {
            tracing::info!("Service startup completed");
        }
    }

    /// Mark the service ready for traffic.
    ///
    /// Returns `false` without changing anything once shutdown has begun.
    pub fn mark_ready(&self) -> bool {
        let result = self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |flags| {
                if flags & SHUTTING_DOWN != 0 {
                    None
                } else {
                    Some(flags | READY)
                }
            });

        match result {
            Ok(previous) => {
                if previous & READY == 0 {
                    tracing::info!("Service marked as ready");
                }
                true
            }
            Err(_) => {
                tracing::debug!("Ignoring ready transition during shutdown");
                false
            }
        }
    }

    /// Stop admitting traffic without starting shutdown.
    pub fn mark_not_ready(&self) {
        let previous = self.flags.fetch_and(!READY, Ordering::AcqRel);
        if previous & READY != 0 {
            tracing::info!("Service marked as not ready");
        }
    }

    /// Enter shutdown: sets the shutting-down flag and clears ready in one
    /// atomic write.
    ///
    /// Returns `true` for the call that actually started shutdown.
    pub fn begin_shutdown(&self) -> bool {
        let previous = match self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |flags| {
                Some((flags | SHUTTING_DOWN) & !READY)
            }) {
            Ok(previous) | Err(previous) => previous,
        };

        let started = previous & SHUTTING_DOWN == 0;
        if started {
            tracing::info!("Service shutting down, readiness withdrawn");
        }
        started
    }

    pub fn is_ready(&self) -> bool {
        self.flags.load(Ordering::Acquire) & READY != 0
    }

    pub fn is_startup_complete(&self) -> bool {
        self.flags.load(Ordering::Acquire) & STARTUP_COMPLETE != 0
    }

    pub fn is_shutting_down(&self) -> bool {
        self.flags.load(Ordering::Acquire) & SHUTTING_DOWN != 0
    }

    pub fn snapshot(&self) -> ReadinessSnapshot {
        let flags = self.flags.load(Ordering::Acquire);
        ReadinessSnapshot {
            startup_complete: flags & STARTUP_COMPLETE != 0,
            ready: flags & READY != 0,
            shutting_down: flags & SHUTTING_DOWN != 0,
        }
    }
}
