use std::fmt;

use thiserror::Error;
use tokio::task;

/// Why a task was asked to terminate.
///
/// The reason is passed through to the interrupted operation, which reports it via
/// [`Terminated::reason()`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TerminateReason {
    /// Generic request to stop whatever the task is waiting for.
    #[default]
    Interrupted,

    /// The task took part in a [`race()`][crate::race] and another participant finished first.
    LostRace,

    /// The application is shutting down.
    Shutdown,

    /// Application-defined reason.
    Custom(&'static str),
}

impl fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => f.write_str("interrupted"),
            Self::LostRace => f.write_str("lost a race"),
            Self::Shutdown => f.write_str("shutting down"),
            Self::Custom(reason) => f.write_str(reason),
        }
    }
}

/// An interruptible operation was terminated before it could complete.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("operation terminated: {reason}")]
pub struct Terminated {
    reason: TerminateReason,
}

impl Terminated {
    pub(crate) fn new(reason: TerminateReason) -> Self {
        Self { reason }
    }

    /// The reason given by whoever terminated the operation.
    #[must_use]
    pub fn reason(&self) -> TerminateReason {
        self.reason
    }
}

/// A spawned task did not produce a result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JoinError {
    /// The task body panicked.
    #[error("task panicked: {message}")]
    Panicked {
        /// The panic message, if the payload was a string.
        message: String,
    },

    /// The task was aborted or the runtime shut down before it finished.
    #[error("task was aborted before it finished")]
    Aborted,
}

impl From<task::JoinError> for JoinError {
    fn from(error: task::JoinError) -> Self {
        match error.try_into_panic() {
            Ok(payload) => {
                let message = if let Some(message) = payload.downcast_ref::<&str>() {
                    (*message).to_string()
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    message.clone()
                } else {
                    "unknown panic payload".to_string()
                };

                Self::Panicked { message }
            }
            Err(_) => Self::Aborted,
        }
    }
}
