use std::future::Future;

use tracing::debug;

use crate::{TaskContext, TaskHandle};

/// Spawns a cancellable task on the current tokio runtime.
///
/// `body` receives the [`TaskContext`] of the new task and returns the future to run. The task
/// starts running right away; it does not wait for the handle to be polled.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn<B, F>(body: B) -> TaskHandle<F::Output>
where
    B: FnOnce(TaskContext) -> F,
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let context = TaskContext::new();
    let terminator = context.terminator();

    let join = tokio::spawn(body(context));
    debug!("spawned cancellable task");

    TaskHandle::new(join, terminator)
}
