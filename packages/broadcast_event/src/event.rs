use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::task::{Context, Poll};

use crate::Waiter;

/// The value of `Event::state` that marks the event as set.
///
/// Waiters are heap-allocated with at least pointer alignment, so no waiter can ever live at
/// this address and the value cannot be confused with the head of a wait list.
const SET: *mut Waiter = ptr::without_provenance_mut(1);

/// A single-shot broadcast signal that any number of tasks can await.
///
/// See the [crate-level documentation][crate] for an overview.
///
/// The entire state of the event is one atomic word:
///
/// * null - the event is not set and nobody is waiting.
/// * [`SET`] - the event is set.
/// * anything else - the event is not set and the word is the head of a singly-linked list of
///   [`Waiter`]s, most recently enqueued first.
///
/// # Thread safety
///
/// `set()`, `is_set()` and `wait()` may be used concurrently from any number of threads.
/// `reset()` must not be called concurrently with `set()`.
pub struct Event {
    state: AtomicPtr<Waiter>,
}

impl Event {
    /// Creates a new event in the unset state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Creates a new event that is already set.
    #[must_use]
    pub const fn new_set() -> Self {
        Self {
            state: AtomicPtr::new(SET),
        }
    }

    /// Creates a new event, set or unset depending on `set`.
    #[must_use]
    pub const fn with_state(set: bool) -> Self {
        if set { Self::new_set() } else { Self::new() }
    }

    /// Whether the event is currently set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == SET
    }

    /// Returns a future that completes once the event is set.
    ///
    /// If the event is already set when the future is first polled, it completes immediately
    /// without suspending.
    pub fn wait(&self) -> Wait<'_> {
        Wait {
            event: self,
            waiter: None,
        }
    }

    /// Sets the event, resuming every task that is currently waiting for it.
    ///
    /// Every waiter that was enqueued before this call is resumed exactly once. Setting an event
    /// that is already set has no effect.
    #[cfg_attr(test, mutants::skip)] // Critical - mutation can cause UB, timeouts and hailstorms.
    pub fn set(&self) {
        // Release so that waiters see everything we wrote before setting the event.
        // Acquire so that we see the `next` links written by the waiters before they enqueued.
        let previous = self.state.swap(SET, Ordering::AcqRel);

        if previous == SET {
            return;
        }

        // SAFETY: We swapped the list out of the shared state, so we are now its sole owner.
        // Nobody else can reach these waiters through the event anymore.
        unsafe {
            resume_all(previous);
        }
    }

    /// Returns a set event to the unset state. Has no effect if the event is not set.
    ///
    /// This must not be called concurrently with [`set()`][Self::set] - callers are expected to
    /// serialize the two themselves.
    pub fn reset(&self) {
        // A failed exchange means the event was not set (possibly with waiters enqueued),
        // which we leave untouched.
        _ = self
            .state
            .compare_exchange(SET, ptr::null_mut(), Ordering::Acquire, Ordering::Relaxed);
    }

    /// Links the waiter into the wait list.
    ///
    /// Returns `false` without enqueueing if the event turns out to be set, in which case the
    /// caller must not suspend.
    #[cfg_attr(test, mutants::skip)] // Critical - mutation can cause UB, timeouts and hailstorms.
    fn enqueue(&self, waiter: &Arc<Waiter>) -> bool {
        // The list owns its own reference to the waiter, released by whoever detaches the list.
        let node = Arc::into_raw(Arc::clone(waiter)).cast_mut();

        let mut head = self.state.load(Ordering::Acquire);

        loop {
            if head == SET {
                // SAFETY: We created this pointer above and never published it, so we still
                // own the reference it represents.
                drop(unsafe { Arc::from_raw(node) });
                return false;
            }

            // Nobody else can see the node yet, so relaxed is enough here. The Release on the
            // successful exchange below publishes this write.
            waiter.next.store(head, Ordering::Relaxed);

            match self.state.compare_exchange_weak(
                head,
                node,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => head = actual,
            }
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("is_set", &self.is_set())
            .finish()
    }
}

impl Drop for Event {
    #[cfg_attr(test, mutants::skip)] // Mutations only leak memory, which tests cannot observe.
    fn drop(&mut self) {
        let head = *self.state.get_mut();

        if head == SET {
            return;
        }

        // Any waiters still linked belong to futures that were dropped while pending (a live
        // `Wait` borrows the event, so none can outlive it). We only release our references.
        let mut current = head;

        while !current.is_null() {
            // SAFETY: Every node in the list was published by `enqueue()` via `Arc::into_raw`
            // and we have exclusive access to the list because we have `&mut self`.
            let waiter = unsafe { Arc::from_raw(current) };
            current = waiter.next.load(Ordering::Relaxed);
        }
    }
}

/// Resumes every waiter in a detached wait list.
///
/// # Safety
///
/// The caller must be the sole owner of the list starting at `head`, which must be either null
/// or a node published by `Event::enqueue()`.
unsafe fn resume_all(head: *mut Waiter) {
    let mut current = head;

    while !current.is_null() {
        // SAFETY: Forwarding the guarantees from the caller. This takes over the reference
        // that the list held, which is released at the end of the iteration.
        let waiter = unsafe { Arc::from_raw(current) };

        // We read the link before resuming - once resumed, the waiter belongs to its future.
        current = waiter.next.load(Ordering::Relaxed);

        waiter.resume();
    }
}

/// Future returned by [`Event::wait()`].
///
/// Completes once the event is set. Dropping the future before that is allowed at any time.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Wait<'a> {
    event: &'a Event,

    /// Set once we have enqueued ourselves into the wait list of the event.
    waiter: Option<Arc<Waiter>>,
}

impl Future for Wait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(waiter) = &this.waiter {
            // Already enqueued. We only refresh the waker, we never enqueue twice.
            if waiter.is_resumed() {
                return Poll::Ready(());
            }

            waiter.register(cx.waker());

            // The event may have been set between our check and the registration.
            return if waiter.is_resumed() {
                Poll::Ready(())
            } else {
                Poll::Pending
            };
        }

        if this.event.is_set() {
            return Poll::Ready(());
        }

        let waiter = Arc::new(Waiter::new(cx.waker()));

        if !this.event.enqueue(&waiter) {
            return Poll::Ready(());
        }

        this.waiter = Some(waiter);
        Poll::Pending
    }
}
