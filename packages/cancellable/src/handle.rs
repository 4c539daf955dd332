use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task;

use crate::{JoinError, TerminateReason, Terminator};

/// Handle to a task started by [`spawn()`][crate::spawn].
///
/// Awaiting the handle returns the output of the task body. Dropping the handle detaches the
/// task, which keeps running in the background.
pub struct TaskHandle<R> {
    join: task::JoinHandle<R>,
    terminator: Terminator,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(join: task::JoinHandle<R>, terminator: Terminator) -> Self {
        Self { join, terminator }
    }

    /// Terminates the operation the task is currently suspended on.
    ///
    /// See [`Terminator::terminate()`] for the exact semantics.
    #[expect(
        clippy::must_use_candidate,
        reason = "the result is informational, most callers do not care"
    )]
    pub fn terminate(&self, reason: TerminateReason) -> bool {
        self.terminator.terminate(reason)
    }

    /// Terminates with [`TerminateReason::Interrupted`].
    #[expect(
        clippy::must_use_candidate,
        reason = "the result is informational, most callers do not care"
    )]
    pub fn interrupt(&self) -> bool {
        self.terminator.interrupt()
    }

    /// A terminator for this task that can be handed out independently of the handle.
    #[must_use]
    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Whether the task has finished running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the task at its next suspension point by dropping it, without giving it a chance to
    /// observe the termination. Awaiting the handle afterwards returns [`JoinError::Aborted`]
    /// unless the task had already finished.
    pub fn abort(&self) {
        self.join.abort();
    }
}

impl<R> Future for TaskHandle<R> {
    type Output = Result<R, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.join)
            .poll(cx)
            .map(|result| result.map_err(JoinError::from))
    }
}

impl<R> fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("is_finished", &self.join.is_finished())
            .field("terminator", &self.terminator)
            .finish()
    }
}
