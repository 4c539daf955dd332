//! Single-shot broadcast signal that any number of tasks can await.
//!
//! An [`Event`] starts out unset. Any number of tasks may [`wait()`][Event::wait] for it and
//! every one of them is resumed once [`set()`][Event::set] is called. Tasks that start waiting
//! after the event has been set do not suspend at all.
//!
//! The event carries no payload - it is purely a "this has happened" signal. Writes made before
//! `set()` are visible to every waiter after it resumes.
//!
//! # Example
//!
//! ```rust
//! use broadcast_event::Event;
//! use futures::executor::block_on;
//! use futures::future::join;
//!
//! let event = Event::new();
//!
//! block_on(join(
//!     async {
//!         event.wait().await;
//!         assert!(event.is_set());
//!     },
//!     async {
//!         event.set();
//!     },
//! ));
//! ```
//!
//! # Resetting
//!
//! [`reset()`][Event::reset] returns a set event to the unset state. Resetting is not
//! synchronized against `set()` - the owner of the event must make sure the two are never
//! called concurrently (typically by having a single task own both operations).

mod event;
mod waiter;

pub use event::*;
pub(crate) use waiter::*;
