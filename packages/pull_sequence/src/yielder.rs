use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;

/// The slot through which a producer hands one value at a time to its consumer.
pub(crate) type Slot<T> = Arc<Mutex<Option<T>>>;

/// Handed to the producer of a [`PullSequence`][crate::PullSequence] for yielding values.
pub struct Yielder<T> {
    slot: Slot<T>,
}

impl<T> Yielder<T> {
    pub(crate) fn new(slot: Slot<T>) -> Self {
        Self { slot }
    }

    /// Hands `value` to the consumer and suspends the producer until the next pull.
    pub fn yield_value(&self, value: T) -> YieldValue<'_, T> {
        YieldValue {
            slot: &self.slot,
            value: Some(value),
        }
    }
}

impl<T> fmt::Debug for Yielder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>()).finish_non_exhaustive()
    }
}

/// Future returned by [`Yielder::yield_value()`].
///
/// The first poll stores the value and suspends without scheduling a wake-up: it is the
/// consumer that decides when to resume the producer, by pulling again. The second poll (the
/// next pull) completes.
#[must_use = "the value is only handed over when the future is awaited"]
pub struct YieldValue<'a, T> {
    slot: &'a Mutex<Option<T>>,
    value: Option<T>,
}

// We never pin `value` (it is moved out into the slot), so moving the future is fine even if
// `T` itself is `!Unpin`.
impl<T> Unpin for YieldValue<'_, T> {}

impl<T> Future for YieldValue<'_, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match this.value.take() {
            Some(value) => {
                let previous = this.slot.lock().replace(value);
                debug_assert!(
                    previous.is_none(),
                    "producer yielded twice without the consumer pulling in between"
                );

                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}

impl<T> fmt::Debug for YieldValue<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("handed_over", &self.value.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::task::Waker;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Yielder<u8>: Send, Sync, fmt::Debug);
    assert_impl_all!(YieldValue<'static, u8>: Send, Unpin);

    #[test]
    fn first_poll_stores_value_and_suspends() {
        let slot: Slot<u32> = Arc::new(Mutex::new(None));
        let yielder = Yielder::new(Arc::clone(&slot));

        let mut cx = Context::from_waker(Waker::noop());
        let mut yield_value = pin!(yielder.yield_value(7));

        assert_eq!(yield_value.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(slot.lock().take(), Some(7));

        assert_eq!(yield_value.as_mut().poll(&mut cx), Poll::Ready(()));
        assert!(slot.lock().is_none());
    }
}
