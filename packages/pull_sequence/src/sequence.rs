use std::any::type_name;
use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use futures::executor::{BlockingStream, block_on_stream};
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::{Slot, Yielder};

/// Where a [`PullSequence`] is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequenceState {
    /// Nobody has pulled yet; the producer has not started running.
    NotStarted,

    /// The most recent pull returned a value and the producer is parked at a yield point.
    HasValue,

    /// The producer finished successfully. Every further pull returns no value.
    Completed,

    /// The producer failed and the error was handed to the consumer. Every further pull
    /// returns no value.
    Failed,
}

/// A lazily driven producer that hands over one value per pull.
///
/// See the [crate-level documentation][crate] for an overview.
///
/// The sequence is also a [`Stream`] of `Result<T, E>` with the same semantics: an error is
/// delivered as one `Some(Err(_))` item, after which the stream ends.
#[must_use = "the producer only runs when the sequence is pulled"]
pub struct PullSequence<T, E> {
    /// `None` once the producer has completed or failed; it is dropped right away so any
    /// resources it holds are released even if the consumer keeps the sequence around.
    producer: Option<BoxFuture<'static, Result<(), E>>>,

    slot: Slot<T>,

    state: SequenceState,
}

impl<T, E> PullSequence<T, E>
where
    T: Send + 'static,
{
    /// Creates a sequence from a producer.
    ///
    /// The producer receives a [`Yielder`] to hand values to the consumer and returns `Ok(())`
    /// when it has no more values or `Err` if it fails. It does not start running until the
    /// first pull.
    pub fn new<F, P>(producer: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> P,
        P: Future<Output = Result<(), E>> + Send + 'static,
    {
        let slot: Slot<T> = Arc::new(Mutex::new(None));
        let producer = producer(Yielder::new(Arc::clone(&slot)));

        Self {
            producer: Some(Box::pin(producer)),
            slot,
            state: SequenceState::NotStarted,
        }
    }

    /// Creates a sequence that yields the elements of `source` in order, then ends.
    pub fn from_source<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let elements = source.into_iter();

        Self::new(move |yielder| async move {
            for element in elements {
                yielder.yield_value(element).await;
            }

            Ok(())
        })
    }
}

impl<T, E> PullSequence<T, E> {
    /// Resumes the producer until it yields the next value, finishes or fails.
    ///
    /// Returns `Ok(Some(_))` for a value, `Ok(None)` once the sequence is exhausted and `Err` if
    /// the producer failed during this step. After an error, every further pull returns
    /// `Ok(None)`.
    ///
    /// # Panics
    ///
    /// If the producer panics, the panic is propagated to the caller.
    pub async fn next(&mut self) -> Result<Option<T>, E> {
        future::poll_fn(|cx| self.poll_pull(cx)).await
    }

    /// The current life cycle state of the sequence.
    #[must_use]
    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Whether every further pull is guaranteed to return no value.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.producer.is_none()
    }

    /// Polling form of [`next()`][Self::next].
    pub fn poll_pull(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<T>, E>> {
        let Some(producer) = self.producer.as_mut() else {
            return Poll::Ready(Ok(None));
        };

        match producer.as_mut().poll(cx) {
            Poll::Ready(Ok(())) => {
                self.finish(SequenceState::Completed);
                Poll::Ready(Ok(None))
            }
            Poll::Ready(Err(error)) => {
                self.finish(SequenceState::Failed);
                Poll::Ready(Err(error))
            }
            Poll::Pending => {
                // Either the producer parked at a yield point, leaving a value behind, or it is
                // waiting for something else, which will wake `cx` when the time comes.
                if let Some(value) = self.slot.lock().take() {
                    self.state = SequenceState::HasValue;
                    Poll::Ready(Ok(Some(value)))
                } else {
                    Poll::Pending
                }
            }
        }
    }

    fn finish(&mut self, state: SequenceState) {
        self.producer = None;
        self.state = state;
    }
}

impl<T, E> PullSequence<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Converts the sequence into a blocking iterator that pulls on the current thread.
    ///
    /// Every `next()` of the iterator blocks the calling thread until the producer yields,
    /// finishes or fails.
    pub fn into_blocking_iter(self) -> BlockingStream<Self> {
        block_on_stream(self)
    }
}

impl<T, E> Stream for PullSequence<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_pull(cx).map(Result::transpose)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_exhausted() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<T, E> fmt::Debug for PullSequence<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
