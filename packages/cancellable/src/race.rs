use std::future::{Future, poll_fn};
use std::pin::{Pin, pin};
use std::task::Poll;

use tracing::trace;

use crate::{TaskContext, TerminateReason, Terminator};

/// Which participant of a [`race()`] finished first, with its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a race has exactly two participants, there is nothing to extend"
)]
pub enum RaceOutcome<A, B> {
    /// The first participant finished first.
    First(A),

    /// The second participant finished first.
    Second(B),
}

impl<A, B> RaceOutcome<A, B> {
    /// Whether the first participant won.
    #[must_use]
    pub fn is_first(&self) -> bool {
        matches!(self, Self::First(_))
    }

    /// Whether the second participant won.
    #[must_use]
    pub fn is_second(&self) -> bool {
        matches!(self, Self::Second(_))
    }
}

/// Runs two operations concurrently until one of them finishes, then terminates the other.
///
/// Each participant receives its own [`TaskContext`] and is expected to await its operations
/// through [`TaskContext::interruptible()`]. As soon as one participant finishes, the other one
/// is terminated with [`TerminateReason::LostRace`] and polled until it finishes as well, so that
/// it can clean up after itself. Its output is discarded. If the loser is inside a protected
/// section, it runs to the end of that section first.
///
/// Both participants are polled by the task that awaits the race, never in parallel. If both are
/// ready in the same poll, the first participant wins.
///
/// ```rust
/// use std::time::Duration;
///
/// use cancellable::{RaceOutcome, race};
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let outcome = race(
///     |context| async move {
///         context
///             .interruptible(tokio::time::sleep(Duration::from_secs(1)))
///             .await
///             .map(|()| "short")
///     },
///     |context| async move {
///         context
///             .interruptible(tokio::time::sleep(Duration::from_secs(60)))
///             .await
///             .map(|()| "long")
///     },
/// )
/// .await;
///
/// assert_eq!(outcome, RaceOutcome::First(Ok("short")));
/// # }
/// ```
pub async fn race<F1, Fut1, F2, Fut2>(
    first: F1,
    second: F2,
) -> RaceOutcome<Fut1::Output, Fut2::Output>
where
    F1: FnOnce(TaskContext) -> Fut1,
    Fut1: Future,
    F2: FnOnce(TaskContext) -> Fut2,
    Fut2: Future,
{
    let first_context = TaskContext::new();
    let first_terminator = first_context.terminator();
    let mut first = pin!(first(first_context));

    let second_context = TaskContext::new();
    let second_terminator = second_context.terminator();
    let mut second = pin!(second(second_context));

    let outcome = poll_fn(|cx| {
        if let Poll::Ready(output) = first.as_mut().poll(cx) {
            return Poll::Ready(RaceOutcome::First(output));
        }

        if let Poll::Ready(output) = second.as_mut().poll(cx) {
            return Poll::Ready(RaceOutcome::Second(output));
        }

        Poll::Pending
    })
    .await;

    match outcome {
        RaceOutcome::First(_) => {
            trace!("first participant won the race");
            drain(second, &second_terminator).await;
        }
        RaceOutcome::Second(_) => {
            trace!("second participant won the race");
            drain(first, &first_terminator).await;
        }
    }

    outcome
}

/// Keeps terminating the loser of a race until it finishes.
///
/// The loser may handle the termination of one operation and move on to another one, so the
/// request is repeated whenever it suspends again.
async fn drain<F>(mut loser: Pin<&mut F>, terminator: &Terminator)
where
    F: Future,
{
    poll_fn(|cx| {
        terminator.terminate(TerminateReason::LostRace);

        match loser.as_mut().poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => {
                // If the loser moved on to a new interruptible operation during this poll, this
                // interrupts it and the wake-up arrives through that operation.
                terminator.terminate(TerminateReason::LostRace);
                Poll::Pending
            }
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::executor::block_on;
    use futures::future;
    use parking_lot::Mutex;
    use tokio::time::{Instant, sleep};

    use super::*;
    use crate::Terminated;

    #[tokio::test(start_paused = true)]
    async fn faster_participant_wins() {
        let outcome = race(
            |context| async move {
                context
                    .interruptible(sleep(Duration::from_secs(5)))
                    .await
                    .map(|()| 'a')
            },
            |context| async move {
                context
                    .interruptible(sleep(Duration::from_secs(1)))
                    .await
                    .map(|()| 'b')
            },
        )
        .await;

        assert_eq!(outcome, RaceOutcome::Second(Ok('b')));
        assert!(outcome.is_second());
    }

    #[tokio::test(start_paused = true)]
    async fn loser_observes_lost_race() {
        let observed = Arc::new(Mutex::new(None));

        let outcome = race(
            |_context| sleep(Duration::from_secs(1)),
            {
                let observed = Arc::clone(&observed);

                move |context| async move {
                    let result = context
                        .interruptible(sleep(Duration::from_secs(60)))
                        .await;

                    *observed.lock() = Some(result);
                }
            },
        )
        .await;

        assert!(outcome.is_first());
        assert_eq!(
            *observed.lock(),
            Some(Err(Terminated::new(TerminateReason::LostRace)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn loser_in_protected_section_finishes_first() {
        let started = Instant::now();
        let finished = Arc::new(Mutex::new(None));

        let outcome = race(
            |_context| sleep(Duration::from_secs(1)),
            {
                let finished = Arc::clone(&finished);

                move |context| async move {
                    let result = context
                        .protected(context.interruptible(sleep(Duration::from_secs(10))))
                        .await;

                    *finished.lock() = Some(result);
                }
            },
        )
        .await;

        assert!(outcome.is_first());
        assert_eq!(*finished.lock(), Some(Ok(())));
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn loser_is_terminated_again_after_recovering() {
        let attempts = Arc::new(Mutex::new(Vec::new()));

        let outcome = race(
            |_context| sleep(Duration::from_secs(1)),
            {
                let attempts = Arc::clone(&attempts);

                move |context| async move {
                    for _ in 0..3 {
                        let result = context
                            .interruptible(sleep(Duration::from_secs(60)))
                            .await;

                        attempts.lock().push(result.is_err());
                    }
                }
            },
        )
        .await;

        assert!(outcome.is_first());
        assert_eq!(*attempts.lock(), vec![true, true, true]);
    }

    #[test]
    fn tie_goes_to_first() {
        let outcome = block_on(race(
            |_context| future::ready(1),
            |_context| future::ready(2),
        ));

        assert_eq!(outcome, RaceOutcome::First(1));
    }
}
