//! Lifecycle coordinator.
//!
//! # Data Flow
//! ```text
//! start():
//!     on_start(A) → on_start(B) → on_start(C)   (first failure aborts,
//!                                                 shutdown abandons the rest)
//!     → mark_startup_complete
//!
//! serve():
//!     listener.bind() → [settle delay, cancelled by shutdown] → mark_ready
//!     → listener exits on its own? → mark_not_ready
//!
//! stop(deadline):
//!     begin_shutdown → listener.shutdown(deadline)
//!     → on_stop(C) → on_stop(B) → on_stop(A)    (errors collected)
//! ```
//!
//! # Design Decisions
//! - One task drives every step sequentially; no fan-out
//! - Startup is fail-fast without rollback; the process exits
//! - Shutdown is best-effort: every running subsystem gets its stop hook
//! - Readiness is withdrawn before anything is torn down

use std::sync::Arc;

use tokio::time::{timeout_at, Instant};

use crate::config::LifecycleConfig;
use crate::health::state::ReadinessState;
use crate::lifecycle::error::{HookError, LifecycleError};
use crate::lifecycle::listener::ServiceListener;
use crate::lifecycle::shutdown::ShutdownListener;
use crate::lifecycle::subsystem::{HookContext, Subsystem, SubsystemState};
use crate::observability::metrics;

struct Entry {
    subsystem: Box<dyn Subsystem>,
    state: SubsystemState,
}

impl Entry {
    fn transition(&mut self, next: SubsystemState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::error!(
                subsystem = %self.subsystem.name(),
                from = %self.state,
                to = %next,
                "Rejected invalid subsystem transition"
            );
            return false;
        }
        tracing::debug!(
            subsystem = %self.subsystem.name(),
            from = %self.state,
            to = %next,
            "Subsystem transition"
        );
        self.state = next;
        true
    }
}

/// How the start phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Every subsystem is running and startup is complete.
    Complete,
    /// Shutdown was requested first. Holds the shutdown deadline.
    Interrupted(Instant),
}

/// Drives registered subsystems and the main listener through startup and
/// shutdown, updating the shared readiness state at each step.
pub struct Coordinator {
    readiness: Arc<ReadinessState>,
    config: LifecycleConfig,
    entries: Vec<Entry>,
}

impl Coordinator {
    pub fn new(readiness: Arc<ReadinessState>, config: LifecycleConfig) -> Self {
        Self {
            readiness,
            config,
            entries: Vec::new(),
        }
    }

    /// Register a subsystem. Registration order is start order.
    pub fn register(&mut self, subsystem: impl Subsystem + 'static) {
        self.register_boxed(Box::new(subsystem));
    }

    pub fn register_boxed(&mut self, subsystem: Box<dyn Subsystem>) {
        tracing::debug!(subsystem = %subsystem.name(), "Subsystem registered");
        self.entries.push(Entry {
            subsystem,
            state: SubsystemState::NotStarted,
        });
    }

    /// Current state of every subsystem, in registration order.
    pub fn states(&self) -> Vec<(&str, SubsystemState)> {
        self.entries
            .iter()
            .map(|entry| (entry.subsystem.name(), entry.state))
            .collect()
    }

    pub fn readiness(&self) -> &Arc<ReadinessState> {
        &self.readiness
    }

    /// Start every subsystem in registration order, then mark startup
    /// complete.
    ///
    /// The first failing (or overrunning) start hook aborts startup.
    /// Subsystems started before it are left running.
    ///
    /// A shutdown request abandons the hook in flight and skips the
    /// remaining subsystems; startup is then never marked complete.
    pub async fn start(&mut self, shutdown: &mut ShutdownListener) -> Result<StartOutcome, LifecycleError> {
        let ctx = HookContext::with_timeout(self.config.start_timeout());
        tracing::info!(
            subsystems = self.entries.len(),
            timeout = ?self.config.start_timeout(),
            "Starting subsystems"
        );

        for entry in &mut self.entries {
            if let Some(deadline) = shutdown.deadline() {
                tracing::info!(next = %entry.subsystem.name(), "Shutdown requested, abandoning startup");
                return Ok(StartOutcome::Interrupted(deadline));
            }

            let name = entry.subsystem.name().to_owned();
            if !entry.transition(SubsystemState::Starting) {
                continue;
            }

            let started = Instant::now();
            let outcome = tokio::select! {
                result = timeout_at(ctx.deadline(), entry.subsystem.on_start(&ctx)) => match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(HookError::Failed(e)),
                    Err(_) => Err(HookError::DeadlineExceeded),
                },
                deadline = shutdown.wait() => {
                    entry.transition(SubsystemState::Failed);
                    tracing::warn!(subsystem = %name, "Shutdown requested, start hook abandoned");
                    return Ok(StartOutcome::Interrupted(deadline));
                }
            };

            match outcome {
                Ok(()) => {
                    entry.transition(SubsystemState::Running);
                    metrics::record_subsystem_start(&name, started.elapsed());
                    tracing::info!(
                        subsystem = %name,
                        elapsed = ?started.elapsed(),
                        "Subsystem started"
                    );
                }
                Err(source) => {
                    entry.transition(SubsystemState::Failed);
                    metrics::record_subsystem_failure(&name, "start");
                    tracing::error!(subsystem = %name, error = %source, "Subsystem failed to start");
                    return Err(LifecycleError::startup(&name, source));
                }
            }
        }

        self.readiness.mark_startup_complete();
        metrics::record_readiness(self.readiness.snapshot());
        Ok(StartOutcome::Complete)
    }

    /// Bind the main listener and mark the service ready.
    ///
    /// The optional settle delay runs on this task and is abandoned if
    /// shutdown is requested first; in that case ready is never set.
    pub async fn serve<L: ServiceListener>(
        &mut self,
        listener: &mut L,
        shutdown: &mut ShutdownListener,
    ) -> Result<(), LifecycleError> {
        let address = listener.bind().await?;
        tracing::info!(address = %address, "Main listener accepting connections");

        let delay = self.config.ready_delay();
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.wait() => {
                    tracing::info!("Shutdown requested before ready delay elapsed");
                    return Ok(());
                }
            }
        }

        if shutdown.deadline().is_some() {
            return Ok(());
        }
        if self.readiness.mark_ready() {
            metrics::record_readiness(self.readiness.snapshot());
        }
        Ok(())
    }

    /// Withdraw readiness, drain the listener, then stop running subsystems
    /// in reverse registration order.
    ///
    /// Every step is bounded by `deadline`. Failures are collected into the
    /// report and never stop the remaining steps.
    pub async fn stop<L: ServiceListener>(
        &mut self,
        listener: Option<&mut L>,
        deadline: Instant,
    ) -> ShutdownReport {
        self.readiness.begin_shutdown();
        metrics::record_readiness(self.readiness.snapshot());

        let mut errors = Vec::new();

        if let Some(listener) = listener {
            tracing::info!("Draining main listener");
            let result = match timeout_at(deadline, listener.shutdown(deadline)).await {
                Ok(result) => result,
                Err(_) => Err(LifecycleError::ListenerShutdownTimeout {
                    listener: "main".to_owned(),
                }),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Main listener shutdown incomplete");
                errors.push(e);
            }
        }

        let ctx = HookContext::new(deadline);
        for entry in self.entries.iter_mut().rev() {
            if entry.state != SubsystemState::Running {
                continue;
            }
            let name = entry.subsystem.name().to_owned();
            entry.transition(SubsystemState::Stopping);

            let outcome = match timeout_at(deadline, entry.subsystem.on_stop(&ctx)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(HookError::Failed(e)),
                Err(_) => Err(HookError::DeadlineExceeded),
            };

            match outcome {
                Ok(()) => {
                    entry.transition(SubsystemState::Stopped);
                    tracing::info!(subsystem = %name, "Subsystem stopped");
                }
                Err(source) => {
                    entry.transition(SubsystemState::Failed);
                    metrics::record_subsystem_failure(&name, "stop");
                    tracing::warn!(subsystem = %name, error = %source, "Subsystem failed to stop");
                    errors.push(LifecycleError::shutdown(&name, source));
                }
            }
        }

        ShutdownReport { errors }
    }

    /// Full lifecycle: start, serve until `shutdown` fires, then stop.
    ///
    /// Fatal errors (startup, bind) are returned as `Err`; everything that
    /// goes wrong during shutdown is in the returned report. A main
    /// listener that exits on its own withdraws readiness and is reported
    /// once the shutdown signal arrives.
    pub async fn run<L: ServiceListener>(
        mut self,
        mut listener: L,
        mut shutdown: ShutdownListener,
    ) -> Result<ShutdownReport, LifecycleError> {
        if let StartOutcome::Interrupted(deadline) = self.start(&mut shutdown).await? {
            tracing::info!("Shutdown requested during startup, skipping main listener");
            return Ok(self.stop::<L>(None, deadline).await);
        }

        self.serve(&mut listener, &mut shutdown).await?;

        let mut listener_failure = None;
        let deadline = tokio::select! {
            deadline = shutdown.wait() => deadline,
            error = listener.closed() => {
                tracing::error!(error = %error, "Main listener stopped serving");
                self.readiness.mark_not_ready();
                metrics::record_readiness(self.readiness.snapshot());
                listener_failure = Some(error);
                shutdown.wait().await
            }
        };
        tracing::info!(
            remaining = ?deadline.saturating_duration_since(Instant::now()),
            "Stopping service"
        );
        let mut report = self.stop(Some(&mut listener), deadline).await;
        if let Some(error) = listener_failure {
            report.errors.insert(0, error);
        }

        if report.is_clean() {
            tracing::info!("Shutdown complete");
        } else {
            tracing::warn!(errors = report.errors().len(), "Shutdown completed with errors");
        }
        Ok(report)
    }
}

/// Non-fatal errors collected during shutdown.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    errors: Vec<LifecycleError>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LifecycleError] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), Vec<LifecycleError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
