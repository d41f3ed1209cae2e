//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into a graceful shutdown
//! - Force exit on a second signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Multiple SIGTERM/SIGINT triggers forced shutdown

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Spawn a task that triggers `shutdown` on the first termination signal and
/// exits the process on the second.
pub fn spawn_signal_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return;
        }
        tracing::info!("Shutdown signal received, draining");
        shutdown.trigger();

        if wait_for_signal().await.is_ok() {
            tracing::warn!("Second shutdown signal received, forcing exit");
            std::process::exit(1);
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = terminate.recv() => tracing::debug!(signal = "SIGTERM", "Signal received"),
        _ = interrupt.recv() => tracing::debug!(signal = "SIGINT", "Signal received"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
