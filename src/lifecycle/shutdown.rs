//! Shutdown coordination.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Coordinator for graceful shutdown.
///
/// Holds a watch channel that all long-running tasks can subscribe to. The
/// channel carries the shutdown deadline once shutdown has been requested.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<Instant>>>,
    /// Time allowed between the trigger and the forced deadline.
    grace: Duration,
}

impl Shutdown {
    /// Create a new shutdown coordinator with the given grace period.
    pub fn new(grace: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            grace,
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
            grace: self.grace,
        }
    }

    /// Trigger shutdown with a deadline one grace period from now.
    ///
    /// Returns `false` if shutdown was already triggered; the original
    /// deadline is kept.
    pub fn trigger(&self) -> bool {
        self.trigger_with_deadline(Instant::now() + self.grace)
    }

    /// Trigger shutdown with an explicit deadline.
    pub fn trigger_with_deadline(&self, deadline: Instant) -> bool {
        let triggered = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(deadline);
            true
        });
        if triggered {
            tracing::info!(grace = ?self.grace, "Shutdown requested");
        }
        triggered
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }
}

/// Receiving half handed to tasks that must react to shutdown.
#[derive(Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<Option<Instant>>,
    grace: Duration,
}

impl ShutdownListener {
    /// The deadline, if shutdown has been triggered.
    pub fn deadline(&self) -> Option<Instant> {
        *self.rx.borrow()
    }

    /// Wait until shutdown is triggered and return its deadline.
    ///
    /// If every [`Shutdown`] handle is dropped first, this resolves with a
    /// deadline one grace period from now.
    pub async fn wait(&mut self) -> Instant {
        let fallback = self.grace;
        let deadline = match self.rx.wait_for(Option::is_some).await {
            Ok(deadline) => *deadline,
            Err(_) => None,
        };
        deadline.unwrap_or_else(|| Instant::now() + fallback)
    }
}
