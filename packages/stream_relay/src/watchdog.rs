use cancellable::TaskContext;
use tokio::time::sleep_until;
use tracing::debug;

use crate::{Direction, DirectionOutcome};

/// Sleeps until the direction has been idle for a full grace period.
///
/// Every time the watchdog wakes up, it checks whether the transfer has pushed the deadline out
/// in the meantime and if so, goes back to sleep until the new deadline. The watchdog never
/// modifies the deadline itself.
///
/// Returns [`DirectionOutcome::IdleExpired`] once the deadline passes without being extended, or
/// [`DirectionOutcome::Cancelled`] if terminated first.
pub(crate) async fn watchdog(context: TaskContext, direction: &Direction) -> DirectionOutcome {
    loop {
        let deadline = direction.deadline();

        if context.interruptible(sleep_until(deadline)).await.is_err() {
            return DirectionOutcome::Cancelled;
        }

        if direction.is_idle() {
            debug!(direction = direction.name(), "idle grace period expired");
            return DirectionOutcome::IdleExpired;
        }
    }
}
