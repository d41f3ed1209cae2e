//! TCP listener binding and serving tasks.
//!
//! # Responsibilities
//! - Bind to configured address(es)
//! - Run an axum router on a background task
//! - Graceful drain bounded by a deadline, abort once it passes

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout_at, Instant};

use crate::lifecycle::LifecycleError;

/// Bind a TCP listener, mapping failures to a fatal lifecycle error.
pub async fn bind(address: &str) -> Result<TcpListener, LifecycleError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| LifecycleError::ListenerBindFailure {
            address: address.to_owned(),
            source,
        })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| LifecycleError::ListenerBindFailure {
            address: address.to_owned(),
            source,
        })?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

/// A router being served on a background task.
pub struct ServingTask {
    name: &'static str,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// `None` once the serve loop has been observed to exit.
    handle: Option<JoinHandle<io::Result<()>>>,
}

fn serve_outcome(result: Result<io::Result<()>, JoinError>) -> Result<(), LifecycleError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(LifecycleError::ListenerFailure(e)),
        Err(join_err) => Err(LifecycleError::ListenerFailure(io::Error::other(join_err))),
    }
}

impl ServingTask {
    /// Serve `router` on `listener` until [`ServingTask::stop`] is called.
    pub fn spawn(name: &'static str, listener: TcpListener, router: Router) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(listener = name, address = %local_addr, "Serving");

        Ok(Self {
            name,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves when the serve loop exits before [`ServingTask::stop`].
    ///
    /// Cancel safe. After it resolves, `stop` has nothing left to drain.
    pub async fn closed(&mut self) -> LifecycleError {
        let Some(handle) = self.handle.as_mut() else {
            return std::future::pending().await;
        };
        let result = handle.await;
        self.handle = None;
        let error = match serve_outcome(result) {
            Ok(()) => LifecycleError::ListenerFailure(io::Error::other("serve loop exited")),
            Err(e) => e,
        };
        tracing::error!(listener = self.name, error = %error, "Listener stopped serving");
        error
    }

    /// Stop accepting, drain open connections until `deadline`, then abort.
    pub async fn stop(&mut self, deadline: Instant) -> Result<(), LifecycleError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };

        let drained = timeout_at(deadline, &mut *handle).await;
        match drained {
            Ok(result) => {
                self.handle = None;
                serve_outcome(result)?;
                tracing::info!(listener = self.name, "Listener drained");
                Ok(())
            }
            Err(_) => {
                handle.abort();
                self.handle = None;
                tracing::warn!(listener = self.name, "Drain deadline passed, aborting connections");
                Err(LifecycleError::ListenerShutdownTimeout {
                    listener: self.name.to_owned(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::routing::get;

    use super::*;

    #[tokio::test]
    async fn bind_failure_is_reported_with_address() {
        let taken = bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap().to_string();

        match bind(&address).await {
            Err(LifecycleError::ListenerBindFailure { address: reported, .. }) => {
                assert_eq!(reported, address)
            }
            other => panic!("expected bind failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn serves_until_stopped() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "hello" }));
        let mut task = ServingTask::spawn("test", listener, router).unwrap();
        let url = format!("http://{}/", task.local_addr());

        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "hello");

        task.stop(Instant::now() + Duration::from_secs(5)).await.unwrap();
        assert!(reqwest::get(&url).await.is_err());
    }

    #[tokio::test]
    async fn slow_request_past_deadline_is_aborted() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let mut task = ServingTask::spawn("slow", listener, router).unwrap();
        let url = format!("http://{}/slow", task.local_addr());

        let request = tokio::spawn(async move { reqwest::get(&url).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = task
            .stop(Instant::now() + Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::ListenerShutdownTimeout { .. }));
        assert!(request.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn dead_serve_loop_is_reported_once() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "hello" }));
        let mut task = ServingTask::spawn("dead", listener, router).unwrap();

        task.handle.as_ref().unwrap().abort();
        let err = tokio::time::timeout(Duration::from_secs(5), task.closed())
            .await
            .unwrap();
        assert!(matches!(err, LifecycleError::ListenerFailure(_)));

        task.stop(Instant::now() + Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn closed_stays_pending_while_serving() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "hello" }));
        let mut task = ServingTask::spawn("live", listener, router).unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(100), task.closed()).await;
        assert!(waited.is_err());

        task.stop(Instant::now() + Duration::from_secs(5)).await.unwrap();
    }
}
