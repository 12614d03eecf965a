//! # Station arbiter
//!
//! Each station is a flag "who holds it" behind a mutex, plus a condvar to wait for it to free up.
//!
//! Releasing broadcasts to every thread waiting on that station. They all wake, re-lock the mutex one by one,
//! and the first one to see the station free takes it. The rest go back to sleep.
//! There's no queue, so any waiter may win regardless of how long it waited: fairness is weak on purpose.
//! A ticket queue would give FIFO order if it's ever needed.
//!
//! The station is handed out as a [StationGuard], which frees the station on drop.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::roster::{OperativeId, StationId};

#[derive(Debug, Default)]
struct StationState {
    /// None - free
    holder: Option<OperativeId>,
    /// threads blocked in [StationArbiter::acquire]
    waiting: usize,
}

#[derive(Debug, Default)]
struct Station {
    state: Mutex<StationState>,
    freed: Condvar,
}

impl Station {
    fn lock(&self) -> MutexGuard<'_, StationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct StationArbiter {
    stations: Vec<Station>,
}

impl StationArbiter {
    /// All stations start free
    pub fn new(count: usize) -> Self {
        Self {
            stations: (0..count).map(|_| Station::default()).collect(),
        }
    }

    /// Blocks until the station is free, then takes it.
    ///
    /// `on_wait` runs (under the station's mutex) if the station is taken at the moment of asking,
    /// it gets the number of threads already waiting for it.
    ///
    /// # Panics
    /// - if there's no such station
    pub fn acquire(
        &self,
        station: StationId,
        who: OperativeId,
        on_wait: impl FnOnce(usize),
    ) -> StationGuard<'_> {
        let slot = &self.stations[station.0];
        let mut state = slot.lock();

        if state.holder.is_some() {
            on_wait(state.waiting);
        }

        state.waiting += 1;
        while state.holder.is_some() {
            state = slot.freed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state.waiting -= 1;
        state.holder = Some(who);
        debug!(%station, operative = %who, waiting = state.waiting, "station taken");

        StationGuard {
            arbiter: self,
            station,
            who,
        }
    }

    fn release(&self, station: StationId, who: OperativeId) {
        let slot = &self.stations[station.0];
        let mut state = slot.lock();
        debug_assert_eq!(state.holder, Some(who), "station freed by a non-holder");
        state.holder = None;
        debug!(%station, operative = %who, waiting = state.waiting, "station freed");
        // wake all of them, whoever re-locks first wins
        slot.freed.notify_all();
    }

    pub fn holder(&self, station: StationId) -> Option<OperativeId> {
        self.stations[station.0].lock().holder
    }

    pub fn waiting(&self, station: StationId) -> usize {
        self.stations[station.0].lock().waiting
    }
}

/// Proof of holding a station. Dropping it frees the station.
#[must_use = "the station is freed as soon as the guard is dropped"]
pub struct StationGuard<'a> {
    arbiter: &'a StationArbiter,
    station: StationId,
    who: OperativeId,
}

impl StationGuard<'_> {
    pub fn station(&self) -> StationId {
        self.station
    }

    /// Same as dropping, but reads better at the call site
    pub fn release(self) {}
}

impl Drop for StationGuard<'_> {
    fn drop(&mut self) {
        self.arbiter.release(self.station, self.who);
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::atomic::{AtomicUsize, Ordering::SeqCst},
        thread::{scope, sleep},
        time::Duration,
    };

    use super::*;

    #[test]
    fn one_holder_at_a_time() {
        let arbiter = StationArbiter::new(1);
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);
        let waits = AtomicUsize::new(0);

        scope(|s| {
            for id in 1..=8 {
                let (arbiter, inside, max_inside, waits) = (&arbiter, &inside, &max_inside, &waits);
                s.spawn(move || {
                    for _ in 0..20 {
                        let guard = arbiter.acquire(StationId(0), OperativeId(id), |_| {
                            waits.fetch_add(1, SeqCst);
                        });
                        let now = inside.fetch_add(1, SeqCst) + 1;
                        max_inside.fetch_max(now, SeqCst);
                        assert_eq!(arbiter.holder(StationId(0)), Some(OperativeId(id)));
                        sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, SeqCst);
                        guard.release();
                    }
                });
            }
        });

        assert_eq!(max_inside.load(SeqCst), 1);
        assert!(waits.load(SeqCst) > 0);
        assert_eq!(arbiter.holder(StationId(0)), None);
        assert_eq!(arbiter.waiting(StationId(0)), 0);
    }

    #[test]
    fn stations_are_independent() {
        let arbiter = StationArbiter::new(2);
        let first = arbiter.acquire(StationId(0), OperativeId(1), |_| panic!("station 0 is free"));
        // the other station is free even though the first one is held
        let second = arbiter.acquire(StationId(1), OperativeId(2), |_| panic!("station 1 is free"));
        assert_eq!(arbiter.holder(StationId(0)), Some(OperativeId(1)));
        assert_eq!(arbiter.holder(StationId(1)), Some(OperativeId(2)));
        drop(first);
        drop(second);
        assert_eq!(arbiter.holder(StationId(0)), None);
    }

    #[test]
    fn waiter_gets_station_after_release() {
        let arbiter = StationArbiter::new(1);
        let guard = arbiter.acquire(StationId(0), OperativeId(1), |_| {});
        let noticed = AtomicUsize::new(0);

        scope(|s| {
            let waiter = s.spawn(|| {
                let g = arbiter.acquire(StationId(0), OperativeId(2), |already| {
                    assert_eq!(already, 0);
                    noticed.fetch_add(1, SeqCst);
                });
                arbiter.holder(g.station())
            });

            while arbiter.waiting(StationId(0)) == 0 {
                sleep(Duration::from_millis(1));
            }
            guard.release();
            assert_eq!(waiter.join().unwrap(), Some(OperativeId(2)));
        });

        assert_eq!(noticed.load(SeqCst), 1);
    }
}
