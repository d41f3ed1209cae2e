//! Lifecycle error types.

use std::io;

use crate::lifecycle::subsystem::BoxError;

/// Why a single lifecycle hook did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("{0}")]
    Failed(BoxError),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Errors surfaced by the lifecycle coordinator.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A subsystem's start hook failed or overran the start deadline.
    #[error("subsystem `{subsystem}` failed to start: {source}")]
    StartupFailure {
        subsystem: String,
        #[source]
        source: HookError,
    },

    /// A subsystem's stop hook failed or overran the stop deadline.
    #[error("subsystem `{subsystem}` failed to stop: {source}")]
    ShutdownFailure {
        subsystem: String,
        #[source]
        source: HookError,
    },

    /// A listener could not bind its address.
    #[error("failed to bind {address}: {source}")]
    ListenerBindFailure {
        address: String,
        #[source]
        source: io::Error,
    },

    /// A listener did not finish draining before the deadline.
    #[error("listener `{listener}` did not drain before the deadline")]
    ListenerShutdownTimeout { listener: String },

    /// A running listener terminated with an error.
    #[error("listener error: {0}")]
    ListenerFailure(#[from] io::Error),
}

impl LifecycleError {
    /// Fatal errors abort the process with a non-zero exit; the rest are
    /// reported during shutdown and logged.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LifecycleError::StartupFailure { .. } | LifecycleError::ListenerBindFailure { .. }
        )
    }

    pub(crate) fn startup(subsystem: &str, source: HookError) -> Self {
        LifecycleError::StartupFailure {
            subsystem: subsystem.to_owned(),
            source,
        }
    }

    pub(crate) fn shutdown(subsystem: &str, source: HookError) -> Self {
        LifecycleError::ShutdownFailure {
            subsystem: subsystem.to_owned(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failure_names_subsystem() {
        let err = LifecycleError::startup("database", HookError::Failed("connection refused".into()));
        assert_eq!(
            err.to_string(),
            "subsystem `database` failed to start: connection refused"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn shutdown_errors_are_not_fatal() {
        let err = LifecycleError::shutdown("cache", HookError::DeadlineExceeded);
        assert_eq!(err.to_string(), "subsystem `cache` failed to stop: deadline exceeded");
        assert!(!err.is_fatal());

        let timeout = LifecycleError::ListenerShutdownTimeout {
            listener: "http".into(),
        };
        assert!(!timeout.is_fatal());
    }

    #[test]
    fn bind_failure_is_fatal() {
        let err = LifecycleError::ListenerBindFailure {
            address: "0.0.0.0:8080".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("failed to bind 0.0.0.0:8080"));
    }
}
