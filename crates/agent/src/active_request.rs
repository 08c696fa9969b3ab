//! The in-flight request slot.
//!
//! At most one request is live at a time. Each turn opens one with
//! [`ActiveRequest::begin`] and holds the returned [`ActiveGuard`] for its
//! whole lifetime; dropping the guard clears the slot on every exit path.
//! An external interrupt either cancels the live request or reports that
//! nothing is running, so the caller can shut down instead.
//!
//! Every begin bumps a generation counter. A guard only clears the slot if
//! it still holds its own generation, and an interrupt only ever sees the
//! current entry, so a turn finishing concurrently with a signal can neither
//! erase a newer request nor have a stale token cancelled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// A live request was cancelled; the session continues.
    CancelledTurn,
    /// Nothing was running; the caller should shut down.
    Idle,
}

#[derive(Default)]
struct Slot {
    next_generation: u64,
    live: Option<(u64, CancellationToken)>,
}

/// Shared handle to the single active-request slot.
#[derive(Clone, Default)]
pub struct ActiveRequest {
    slot: Arc<Mutex<Slot>>,
}

impl ActiveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new request scoped under `parent`.
    pub fn begin(&self, parent: &CancellationToken) -> ActiveGuard {
        let token = parent.child_token();
        let mut slot = self.lock();
        slot.next_generation += 1;
        let generation = slot.next_generation;
        if let Some((stale, old)) = slot.live.replace((generation, token.clone())) {
            warn!(stale, generation, "Active request replaced while still live");
            old.cancel();
        }
        debug!(generation, "Active request opened");
        ActiveGuard {
            slot: Arc::clone(&self.slot),
            generation,
            token,
        }
    }

    /// Cancel the live request, if any.
    pub fn interrupt(&self) -> Interrupt {
        let slot = self.lock();
        match &slot.live {
            Some((generation, token)) => {
                debug!(generation, "Interrupting active request");
                token.cancel();
                Interrupt::CancelledTurn
            }
            None => Interrupt::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().live.is_some()
    }

    /// A clonable handle that can only interrupt.
    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            inner: self.clone(),
        }
    }
}

/// Interrupt-only view of the slot, handed to signal handlers.
#[derive(Clone)]
pub struct InterruptHandle {
    inner: ActiveRequest,
}

impl InterruptHandle {
    pub fn interrupt(&self) -> Interrupt {
        self.inner.interrupt()
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

/// Keeps a request registered; clears it on drop.
pub struct ActiveGuard {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
    token: CancellationToken,
}

impl ActiveGuard {
    /// The token the request must watch.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot
            .live
            .as_ref()
            .is_some_and(|(generation, _)| *generation == self.generation)
        {
            slot.live = None;
            debug!(generation = self.generation, "Active request cleared");
        }
    }
}
