use std::any::type_name;
use std::fmt;
use std::sync::Weak;

use tracing::trace;

use crate::{CancellationCell, TerminateReason};

/// Terminates a task from the outside.
///
/// A terminator does not keep the task alive and can be cloned, sent to other threads and used
/// concurrently with the task without any external synchronization.
#[derive(Clone)]
pub struct Terminator {
    cell: Weak<CancellationCell>,
}

impl Terminator {
    pub(crate) fn new(cell: Weak<CancellationCell>) -> Self {
        Self { cell }
    }

    /// Makes the operation the task is currently suspended on fail with
    /// [`Terminated`][crate::Terminated] carrying `reason`.
    ///
    /// Returns `true` if an operation was interrupted. Returns `false` without any effect if the
    /// task has finished, is not suspended on an interruptible operation or is inside a protected
    /// section. The request is not remembered in that case.
    #[expect(
        clippy::must_use_candidate,
        reason = "the result is informational, most callers do not care"
    )]
    pub fn terminate(&self, reason: TerminateReason) -> bool {
        let Some(cell) = self.cell.upgrade() else {
            trace!(%reason, "termination requested after task finished");
            return false;
        };

        let fired = cell.fire(reason);
        trace!(%reason, fired, "termination requested");

        fired
    }

    /// Terminates with [`TerminateReason::Interrupted`].
    #[expect(
        clippy::must_use_candidate,
        reason = "the result is informational, most callers do not care"
    )]
    pub fn interrupt(&self) -> bool {
        self.terminate(TerminateReason::default())
    }

    /// Whether the task has released its side of the cancellation cell, i.e. it has finished
    /// (or its context was dropped). Terminating a finished task has no effect.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cell.strong_count() == 0
    }
}

impl fmt::Debug for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("is_finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
