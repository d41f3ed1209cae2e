//! Main service listener contract.
//!
//! The coordinator binds the listener after all subsystems are running and
//! shuts it down before any subsystem stops.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::lifecycle::error::LifecycleError;

#[async_trait]
pub trait ServiceListener: Send {
    /// Bind and begin serving. Returns once the socket is accepting.
    async fn bind(&mut self) -> Result<SocketAddr, LifecycleError>;

    /// Stop accepting new connections and drain in-flight requests until
    /// `deadline`.
    async fn shutdown(&mut self, deadline: Instant) -> Result<(), LifecycleError>;

    /// Resolves if the listener stops serving without being shut down.
    /// Listeners that cannot fail this way keep the default, which never
    /// resolves.
    async fn closed(&mut self) -> LifecycleError {
        std::future::pending().await
    }
}
