//! # Completion barrier
//!
//! A single-use latch per unit. Members check in once they're done at a station,
//! the one that brings the count to the threshold fires the latch, and the leader waits for it.
//!
//! Unlike [std::sync::Barrier] nobody but the leader blocks, and it never resets for a 2nd round.
//!
//! The counter and the "fired" flag live behind the same mutex, so:
//! - exactly one check-in sees `arrived == threshold`, even if they race
//! - the leader can call [CompletionBarrier::wait] before or after the firing check-in,
//!   it checks the flag under the mutex before sleeping, so the notification can't slip in between
//!
//! A run that can't start every member abandons its barriers, which wakes the waiting leader
//! with [Released::Abandoned] instead of leaving it blocked for good.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Default)]
struct Latch {
    arrived: usize,
    fired: bool,
    abandoned: bool,
}

#[derive(Debug)]
pub struct CompletionBarrier {
    threshold: usize,
    latch: Mutex<Latch>,
    fired: Condvar,
}

/// Why [CompletionBarrier::wait] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Released {
    Fired,
    /// the unit will never be complete
    Abandoned,
}

/// What a check-in did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckIn {
    /// not everybody's here yet
    Pending { arrived: usize },
    /// this check-in fired the barrier
    Completed,
}

impl CompletionBarrier {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            latch: Mutex::new(Latch::default()),
            fired: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts the caller in.
    ///
    /// The check-in that reaches the threshold runs `on_complete` while still holding the latch
    /// and only then wakes the waiters. So whatever `on_complete` does happens-before the waiter returns.
    pub fn check_in(&self, on_complete: impl FnOnce()) -> CheckIn {
        let mut latch = self.lock();
        latch.arrived += 1;
        debug_assert!(latch.arrived <= self.threshold, "more check-ins than members");

        if latch.arrived == self.threshold {
            debug_assert!(!latch.fired, "barrier fired twice");
            on_complete();
            latch.fired = true;
            debug!(threshold = self.threshold, "barrier fired");
            self.fired.notify_all();
            CheckIn::Completed
        } else {
            CheckIn::Pending {
                arrived: latch.arrived,
            }
        }
    }

    /// Blocks until the barrier fires or gets abandoned, returns right away if either already happened
    pub fn wait(&self) -> Released {
        let mut latch = self.lock();
        loop {
            if latch.fired {
                return Released::Fired;
            }
            if latch.abandoned {
                return Released::Abandoned;
            }
            latch = self.fired.wait(latch).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wakes the waiters without firing. A barrier that already fired stays fired.
    pub fn abandon(&self) {
        let mut latch = self.lock();
        latch.abandoned = true;
        self.fired.notify_all();
    }

    pub fn is_fired(&self) -> bool {
        self.lock().fired
    }

    pub fn arrived(&self) -> usize {
        self.lock().arrived
    }
}
