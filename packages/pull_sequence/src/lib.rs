//! Lazily driven producers that hand over one value per pull.
//!
//! A [`PullSequence`] wraps a producer - an `async` body that hands values to the consumer one
//! at a time through a [`Yielder`]. The producer does not run on its own: every call to
//! [`PullSequence::next()`] resumes it until it yields the next value, finishes or fails. The
//! producer and the consumer therefore never run at the same time.
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use futures::executor::block_on;
//! use pull_sequence::PullSequence;
//!
//! let mut squares = PullSequence::<u32, Infallible>::new(|yielder| async move {
//!     for i in 1..=3 {
//!         yielder.yield_value(i * i).await;
//!     }
//!
//!     Ok(())
//! });
//!
//! block_on(async {
//!     assert_eq!(squares.next().await, Ok(Some(1)));
//!     assert_eq!(squares.next().await, Ok(Some(4)));
//!     assert_eq!(squares.next().await, Ok(Some(9)));
//!     assert_eq!(squares.next().await, Ok(None));
//! });
//! ```
//!
//! # Faults
//!
//! If the producer returns `Err`, that error is returned from the pull during which it
//! happened. The sequence is exhausted afterwards - later pulls return `Ok(None)` and the error
//! is not repeated.
//!
//! # Asynchronous producers
//!
//! Producers may await real asynchronous operations (e.g. reading from a socket) between
//! yields. A pull then stays pending until the producer gets around to yielding or finishing,
//! so such sequences must be pulled from an async context that can wake them up.

mod sequence;
mod yielder;

pub use sequence::*;
pub use yielder::*;
