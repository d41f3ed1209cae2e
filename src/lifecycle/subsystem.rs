//! Subsystem contract and per-subsystem state machine.
//!
//! # State Machine
//! ```text
//! NotStarted → Starting → Running → Stopping → Stopped
//!                  │                    │
//!                  └──────→ Failed ←────┘
//! ```
//!
//! # Design Decisions
//! - Hooks are optional: a subsystem implements only what it needs
//! - Each hook receives a context carrying the phase deadline
//! - The coordinator, not the subsystem, enforces the deadline

use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Error type returned by subsystem hooks.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Context handed to each lifecycle hook.
#[derive(Debug, Clone, Copy)]
pub struct HookContext {
    deadline: Instant,
}

impl HookContext {
    pub fn new(deadline: Instant) -> Self {
        Self { deadline }
    }

    /// Context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Instant::now() + timeout)
    }

    /// The instant by which the hook must return.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A component with a start and stop phase, driven by the coordinator.
///
/// Start hooks run in registration order; stop hooks run in reverse order
/// and only for subsystems whose start hook succeeded.
#[async_trait]
pub trait Subsystem: Send {
    /// Name used in logs, metrics and errors.
    fn name(&self) -> &str;

    /// Acquire resources. Returning an error aborts startup.
    async fn on_start(&mut self, _ctx: &HookContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Release resources. Errors are collected; remaining subsystems are
    /// still stopped.
    async fn on_stop(&mut self, _ctx: &HookContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Lifecycle state of a single registered subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl SubsystemState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SubsystemState) -> bool {
        use SubsystemState::*;
        matches!(
            (self, next),
            (NotStarted, Starting)
                | (Starting, Running)
                | (Starting, Failed)
                | (Running, Stopping)
                | (Stopping, Stopped)
                | (Stopping, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubsystemState::NotStarted => "not_started",
            SubsystemState::Starting => "starting",
            SubsystemState::Running => "running",
            SubsystemState::Stopping => "stopping",
            SubsystemState::Stopped => "stopped",
            SubsystemState::Failed => "failed",
        }
    }
}

impl fmt::Display for SubsystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
