use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use pin_project::{pin_project, pinned_drop};

use crate::{CancellationCell, Terminated, TerminateReason, Ticket};

/// Future returned by [`TaskContext::interruptible()`][crate::TaskContext::interruptible].
#[pin_project(PinnedDrop)]
#[must_use = "futures do nothing unless polled"]
pub struct Interruptible<'a, F> {
    cell: &'a CancellationCell,

    #[pin]
    operation: F,

    registration: Registration,
}

enum Registration {
    /// Not polled yet. The hook is only registered once the operation is actually pending.
    Unregistered,

    /// Our hook is registered in the cell. A termination request fires the hook, which delivers
    /// the reason through the channel.
    Armed {
        ticket: Ticket,
        reason: oneshot::Receiver<TerminateReason>,
    },

    /// A newer operation has replaced our hook, so this operation can no longer be interrupted.
    Superseded,

    Completed,
}

impl<'a, F> Interruptible<'a, F>
where
    F: Future,
{
    pub(crate) fn new(cell: &'a CancellationCell, operation: F) -> Self {
        Self {
            cell,
            operation,
            registration: Registration::Unregistered,
        }
    }
}

impl<F> Future for Interruptible<'_, F>
where
    F: Future,
{
    type Output = Result<F::Output, Terminated>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if matches!(this.registration, Registration::Unregistered) {
            let (sender, receiver) = oneshot::channel();

            let ticket = this.cell.register(Box::new(move |reason| {
                // If the operation has gone away in the meantime, nobody needs to know.
                _ = sender.send(reason);
            }));

            *this.registration = Registration::Armed {
                ticket,
                reason: receiver,
            };
        }

        match this.registration {
            Registration::Armed { reason, .. } => match reason.poll_unpin(cx) {
                Poll::Ready(Ok(reason)) => {
                    // The hook was consumed by firing, so there is nothing left to withdraw.
                    *this.registration = Registration::Completed;
                    return Poll::Ready(Err(Terminated::new(reason)));
                }
                Poll::Ready(Err(oneshot::Canceled)) => {
                    *this.registration = Registration::Superseded;
                }
                Poll::Pending => {}
            },
            Registration::Completed => panic!("Interruptible polled after completion"),
            Registration::Unregistered | Registration::Superseded => {}
        }

        let output = match this.operation.poll(cx) {
            Poll::Ready(output) => output,
            Poll::Pending => return Poll::Pending,
        };

        if let Registration::Armed { ticket, .. } = *this.registration {
            this.cell.withdraw(ticket);
        }

        *this.registration = Registration::Completed;

        Poll::Ready(Ok(output))
    }
}

#[pinned_drop]
impl<F> PinnedDrop for Interruptible<'_, F> {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();

        if let Registration::Armed { ticket, .. } = *this.registration {
            this.cell.withdraw(ticket);
        }
    }
}

impl<F> fmt::Debug for Interruptible<'_, F> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registration = match self.registration {
            Registration::Unregistered => "unregistered",
            Registration::Armed { .. } => "armed",
            Registration::Superseded => "superseded",
            Registration::Completed => "completed",
        };

        f.debug_struct(type_name::<Self>())
            .field("registration", &registration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::task::Waker;

    use futures::future;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::TaskContext;

    assert_impl_all!(Interruptible<'static, future::Ready<u8>>: Send, fmt::Debug);

    #[test]
    fn completes_normally_and_withdraws_hook() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let mut cx = Context::from_waker(Waker::noop());
        let mut operation = pin!(context.interruptible(future::ready(7)));

        assert_eq!(operation.as_mut().poll(&mut cx), Poll::Ready(Ok(7)));

        // Nothing is pending any more, so there is nothing to interrupt.
        assert!(!terminator.interrupt());
    }

    #[test]
    fn termination_fails_pending_operation() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let mut cx = Context::from_waker(Waker::noop());
        let mut operation = pin!(context.interruptible(future::pending::<()>()));

        assert!(operation.as_mut().poll(&mut cx).is_pending());

        assert!(terminator.terminate(TerminateReason::Custom("stop")));

        let Poll::Ready(Err(terminated)) = operation.as_mut().poll(&mut cx) else {
            panic!("operation was not terminated");
        };

        assert_eq!(terminated.reason(), TerminateReason::Custom("stop"));
    }

    #[test]
    fn unpolled_operation_cannot_be_interrupted() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let _operation = context.interruptible(future::pending::<()>());

        assert!(!terminator.interrupt());
    }

    #[test]
    fn newer_operation_supersedes_older() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let mut cx = Context::from_waker(Waker::noop());
        let mut older = pin!(context.interruptible(future::pending::<()>()));
        let mut newer = pin!(context.interruptible(future::pending::<()>()));

        assert!(older.as_mut().poll(&mut cx).is_pending());
        assert!(newer.as_mut().poll(&mut cx).is_pending());

        assert!(terminator.interrupt());

        // Only the most recent operation is interrupted.
        assert!(older.as_mut().poll(&mut cx).is_pending());
        assert!(matches!(
            newer.as_mut().poll(&mut cx),
            Poll::Ready(Err(_))
        ));

        // The older operation stays uninterruptible.
        assert!(!terminator.interrupt());
        assert!(older.as_mut().poll(&mut cx).is_pending());
    }

    #[test]
    fn dropping_pending_operation_withdraws_hook() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        {
            let mut cx = Context::from_waker(Waker::noop());
            let mut operation = pin!(context.interruptible(future::pending::<()>()));
            assert!(operation.as_mut().poll(&mut cx).is_pending());
        }

        assert!(!terminator.interrupt());
    }

    #[test]
    fn dropping_superseded_operation_keeps_newer_hook() {
        let context = TaskContext::new();
        let terminator = context.terminator();

        let mut cx = Context::from_waker(Waker::noop());
        let mut newer = pin!(context.interruptible(future::pending::<()>()));

        {
            let mut older = pin!(context.interruptible(future::pending::<()>()));
            assert!(older.as_mut().poll(&mut cx).is_pending());
            assert!(newer.as_mut().poll(&mut cx).is_pending());
        }

        assert!(terminator.interrupt());
        assert!(matches!(
            newer.as_mut().poll(&mut cx),
            Poll::Ready(Err(_))
        ));
    }
}
