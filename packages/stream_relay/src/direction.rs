use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

// About 30 years, standing in for "never" when the grace period is too long to represent.
const FAR_FUTURE: Duration = Duration::from_secs(946_080_000);

/// State of one relay direction, shared by its transfer and its watchdog.
///
/// Both run in the same task, so the lock is never contended; it only makes the state `Sync`.
#[derive(Debug)]
pub(crate) struct Direction {
    name: &'static str,
    grace: Duration,
    deadline: Mutex<Instant>,
    forwarded: AtomicU64,
}

impl Direction {
    /// Creates the direction with its deadline one grace period from now.
    pub(crate) fn new(name: &'static str, grace: Duration) -> Self {
        Self {
            name,
            grace,
            deadline: Mutex::new(grace_deadline(grace)),
            forwarded: AtomicU64::new(0),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// The instant after which the direction counts as idle.
    pub(crate) fn deadline(&self) -> Instant {
        *self.deadline.lock()
    }

    /// Pushes the deadline out to one grace period from now. Never moves it closer.
    pub(crate) fn extend_deadline(&self) {
        let candidate = grace_deadline(self.grace);

        let mut deadline = self.deadline.lock();
        *deadline = (*deadline).max(candidate);
    }

    /// Whether the deadline has passed without being extended.
    pub(crate) fn is_idle(&self) -> bool {
        self.deadline() <= Instant::now()
    }

    pub(crate) fn record_forwarded(&self, bytes: usize) {
        self.forwarded
            .fetch_add(u64::try_from(bytes).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

fn grace_deadline(grace: Duration) -> Instant {
    let now = Instant::now();

    now.checked_add(grace)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
