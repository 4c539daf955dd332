use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::{CancellationCell, Interruptible, Terminator};

/// The running side of a cancellable task.
///
/// The task body receives the context and keeps it for as long as it runs. Operations awaited
/// through [`interruptible()`][Self::interruptible] can be terminated by the holders of a
/// [`Terminator`] for this context; everything else the task awaits runs to completion.
///
/// Dropping the context marks the task as finished: from then on, termination requests have no
/// effect.
pub struct TaskContext {
    cell: Arc<CancellationCell>,
}

impl TaskContext {
    /// Creates a context that is not attached to any spawned task.
    ///
    /// [`spawn()`][crate::spawn] and [`race()`][crate::race] create contexts for you. A standalone
    /// context is useful for driving cancellable operations from code that manages its own
    /// futures.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(CancellationCell::default()),
        }
    }

    /// Creates a terminator that can terminate the operations of this context.
    #[must_use]
    pub fn terminator(&self) -> Terminator {
        Terminator::new(Arc::downgrade(&self.cell))
    }

    /// Marks `operation` as a suspension point that can be interrupted by a termination request.
    ///
    /// The returned future resolves to `Ok` with the output of `operation` if it completes
    /// normally, or to `Err(Terminated)` if the task is terminated while it is pending. Only the
    /// most recently started interruptible operation of a context can be interrupted.
    pub fn interruptible<F>(&self, operation: F) -> Interruptible<'_, F>
    where
        F: Future,
    {
        Interruptible::new(&self.cell, operation)
    }

    /// Enters a protected section, in which termination requests have no effect.
    ///
    /// The section lasts until the returned guard is dropped, including when the task unwinds.
    pub fn lock(&self) -> ProtectedSection<'_> {
        self.cell.enter_protected();

        ProtectedSection { cell: &self.cell }
    }

    /// Runs `operation` inside a protected section, so it always runs to completion even if
    /// the task is terminated in the meantime.
    pub async fn protected<F>(&self, operation: F) -> F::Output
    where
        F: Future,
    {
        let _section = self.lock();
        operation.await
    }

    /// Whether a protected section is currently open.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.cell.is_locked()
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("cell", &self.cell)
            .finish()
    }
}

/// Keeps a protected section open; see [`TaskContext::lock()`].
#[must_use = "the protected section ends as soon as the guard is dropped"]
pub struct ProtectedSection<'a> {
    cell: &'a CancellationCell,
}

impl Drop for ProtectedSection<'_> {
    fn drop(&mut self) {
        self.cell.leave_protected();
    }
}

impl fmt::Debug for ProtectedSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    use futures::executor::block_on;
    use futures::future;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::TerminateReason;

    assert_impl_all!(TaskContext: Send, Sync, fmt::Debug);
    assert_impl_all!(ProtectedSection<'static>: Send, Sync, fmt::Debug);

    #[test]
    fn lock_is_released_on_drop() {
        let context = TaskContext::new();

        {
            let _section = context.lock();
            assert!(context.is_locked());
        }

        assert!(!context.is_locked());
    }

    #[test]
    fn lock_is_released_on_unwind() {
        let context = TaskContext::new();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _section = context.lock();
            panic!("fault inside protected section");
        }));

        assert!(result.is_err());
        assert!(!context.is_locked());
    }

    #[test]
    fn protected_operation_ignores_termination() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let mut cx = Context::from_waker(Waker::noop());
        let released = Cell::new(false);

        let mut operation = pin!(context.protected(context.interruptible(future::poll_fn(
            |_| {
                if released.get() {
                    Poll::Ready(42)
                } else {
                    Poll::Pending
                }
            }
        ))));

        assert!(operation.as_mut().poll(&mut cx).is_pending());
        assert!(context.is_locked());

        assert!(!terminator.terminate(TerminateReason::Shutdown));

        released.set(true);
        assert_eq!(operation.as_mut().poll(&mut cx), Poll::Ready(Ok(42)));
        assert!(!context.is_locked());
    }

    #[test]
    fn protected_returns_output() {
        let context = TaskContext::new();

        assert_eq!(block_on(context.protected(async { 5 })), 5);
        assert!(!context.is_locked());
    }
}
