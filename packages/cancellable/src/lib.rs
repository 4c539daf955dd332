//! Asynchronous tasks that can be terminated from the outside.
//!
//! Rust futures can always be cancelled by dropping them, but that gives the future no chance to
//! observe the cancellation, clean up in an orderly manner or report what happened. This package
//! offers a cooperative alternative: a task receives a [`TaskContext`] and marks the operations it
//! awaits as [interruptible][TaskContext::interruptible]. Anyone holding the matching
//! [`TaskHandle`] or [`Terminator`] can then [terminate][Terminator::terminate] the task, which
//! makes the operation it is currently suspended on fail with [`Terminated`]. The task resumes at
//! that suspension point and handles the error like any other.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use cancellable::{TerminateReason, spawn};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let task = spawn(|context| async move {
//!     context
//!         .interruptible(tokio::time::sleep(Duration::from_secs(10)))
//!         .await
//! });
//!
//! // Give the task a chance to reach its suspension point.
//! tokio::task::yield_now().await;
//!
//! assert!(task.terminate(TerminateReason::Shutdown));
//!
//! let terminated = task.await.unwrap().unwrap_err();
//! assert_eq!(terminated.reason(), TerminateReason::Shutdown);
//! # }
//! ```
//!
//! # Termination is fire-and-forget
//!
//! Only the operation the task is suspended on at the time of the request can be interrupted.
//! If the task is between suspension points, is suspended on an operation that was not marked
//! interruptible, is inside a [protected section][TaskContext::lock] or has already finished,
//! the request has no effect at all. It is not queued for later and not retried.
//!
//! # Racing
//!
//! [`race()`] runs two operations side by side and terminates the loser once the winner is
//! known, waiting for the loser to wind down before returning.

mod cell;
mod context;
mod error;
mod handle;
mod interruptible;
mod race;
mod spawn;
mod terminator;

pub(crate) use cell::*;
pub use context::*;
pub use error::*;
pub use handle::*;
pub use interruptible::*;
pub use race::*;
pub use spawn::*;
pub use terminator::*;
