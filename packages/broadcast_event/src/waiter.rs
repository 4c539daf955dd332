use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::task::Waker;

use futures::task::AtomicWaker;

/// One suspended `wait()` call, linked into the wait list of an [`Event`][crate::Event].
///
/// Waiters are reference-counted. While linked, the wait list owns one reference and the
/// waiting future owns another, so the waiter stays valid even if the future is dropped before
/// the event is set.
#[derive(Debug)]
pub(crate) struct Waiter {
    /// The next (earlier enqueued) waiter in the list, or null at the tail.
    ///
    /// Written only before the waiter is published into the list and read only by whoever
    /// detached the list, so the ordering of the list head operations covers it.
    pub(crate) next: AtomicPtr<Self>,

    waker: AtomicWaker,

    resumed: AtomicBool,
}

impl Waiter {
    pub(crate) fn new(waker: &Waker) -> Self {
        let atomic_waker = AtomicWaker::new();
        atomic_waker.register(waker);

        Self {
            next: AtomicPtr::new(ptr::null_mut()),
            waker: atomic_waker,
            resumed: AtomicBool::new(false),
        }
    }

    /// Replaces the waker that will be notified on resume.
    pub(crate) fn register(&self, waker: &Waker) {
        self.waker.register(waker);
    }

    pub(crate) fn is_resumed(&self) -> bool {
        // Acquire pairs with the Release in `resume()`, giving the waiter visibility of
        // everything written before the event was set.
        self.resumed.load(Ordering::Acquire)
    }

    /// Marks the waiter as resumed and wakes whoever is polling it.
    ///
    /// Called exactly once per waiter, by the thread that detached the wait list.
    pub(crate) fn resume(&self) {
        self.resumed.store(true, Ordering::Release);
        self.waker.wake();
    }
}
