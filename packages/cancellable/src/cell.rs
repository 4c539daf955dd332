use std::any::type_name;
use std::fmt;

use parking_lot::Mutex;

use crate::TerminateReason;

/// Forces one specific pending operation to fail early.
pub(crate) type Hook = Box<dyn FnOnce(TerminateReason) + Send>;

/// Identifies one registration of a hook, so an operation can withdraw its own hook without
/// accidentally withdrawing a newer one.
pub(crate) type Ticket = u64;

/// State shared between a running task and the observers that may terminate it.
///
/// The task owns the only strong reference; observers hold weak references, so once the task
/// finishes the cell is gone and termination requests find nothing to act on.
#[derive(Default)]
pub(crate) struct CancellationCell {
    state: Mutex<CellState>,
}

#[derive(Default)]
struct CellState {
    hook: Option<(Ticket, Hook)>,
    next_ticket: Ticket,

    // Protected sections may nest; the cell is locked while any of them is open.
    protected_depth: usize,
}

impl CancellationCell {
    /// Registers the hook of the operation that is now pending, replacing any previous hook.
    pub(crate) fn register(&self, hook: Hook) -> Ticket {
        let (ticket, replaced) = {
            let mut state = self.state.lock();

            let ticket = state.next_ticket;
            state.next_ticket = ticket.wrapping_add(1);

            (ticket, state.hook.replace((ticket, hook)))
        };

        // Dropping a hook may wake whoever was waiting on it, which we never do under the lock.
        drop(replaced);

        ticket
    }

    /// Withdraws the hook registered under `ticket`, unless it has already been replaced or used.
    pub(crate) fn withdraw(&self, ticket: Ticket) {
        let withdrawn = {
            let mut state = self.state.lock();

            if state
                .hook
                .as_ref()
                .is_some_and(|(registered, _)| *registered == ticket)
            {
                state.hook.take()
            } else {
                None
            }
        };

        drop(withdrawn);
    }

    /// Takes and invokes the registered hook, unless there is none or the cell is locked.
    ///
    /// Returns whether a hook was invoked.
    pub(crate) fn fire(&self, reason: TerminateReason) -> bool {
        let hook = {
            let mut state = self.state.lock();

            if state.protected_depth > 0 {
                return false;
            }

            state.hook.take()
        };

        match hook {
            Some((_, hook)) => {
                hook(reason);
                true
            }
            None => false,
        }
    }

    pub(crate) fn enter_protected(&self) {
        let mut state = self.state.lock();
        state.protected_depth = state
            .protected_depth
            .checked_add(1)
            .expect("protected sections nested beyond usize::MAX - unrealistic");
    }

    pub(crate) fn leave_protected(&self) {
        let mut state = self.state.lock();
        state.protected_depth = state
            .protected_depth
            .checked_sub(1)
            .expect("left a protected section that was never entered");
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.state.lock().protected_depth > 0
    }

    pub(crate) fn has_hook(&self) -> bool {
        self.state.lock().hook.is_some()
    }
}

impl fmt::Debug for CancellationCell {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct(type_name::<Self>())
            .field("has_hook", &state.hook.is_some())
            .field("protected_depth", &state.protected_depth)
            .finish_non_exhaustive()
    }
}
