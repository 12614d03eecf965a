//! # Priority access lock
//! A read-write lock where readers that are already queued go before a writer that's trying to get in.
//!
//! It has 2 layers, always taken in the same order by both sides:
//! - admission - a token held by at most one writer. While a writer holds it, new readers queue up.
//! - gate - readers hold it collectively (from the first one in to the last one out), a writer holds it alone.
//!
//! Only the writer holding admission may close the gate, so writers never overlap each other or a reader.
//!
//! ## Readers first
//! Readers register as "waiting" before they ask for admission. A writer won't even take admission while
//! anybody is registered, it sleeps on the condvar until the queue drains and gets woken by the reader that empties it.
//! There's no polling and no back-off delay involved.
//!
//! A writer that has taken admission doesn't care about readers that show up afterwards, they queue behind it.
//! That's what keeps a writer from waiting forever on a steady trickle of readers arriving one by one,
//! though a continuous overlapping crowd of readers can still hold it off.
//!
//! Once all waits happen under the one mutex, the "no readers waiting" check and taking admission are atomic,
//! so a reader can't sneak in between them.
//!
//! ## Memory
//! As in any rwlock, `T` is reachable through `&T` from many threads at once => it has to be `Sync`, not only `Send`.
//! The mutex around the counters gives the happens-before between a writer's unlock and the next lock.

use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

#[derive(Debug, Default)]
struct Counts {
    /// readers inside, the gate is held by them if > 0
    active_readers: usize,
    /// a writer is inside, the gate is held by it
    writer_inside: bool,
    /// a writer holds admission
    admission: bool,
    /// readers registered but not inside yet
    waiting_readers: usize,
}

/// What the lock is doing at the moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Idle,
    Shared(usize),
    Exclusive,
}

pub struct PriorityLock<T> {
    counts: Mutex<Counts>,
    changed: Condvar,
    value: UnsafeCell<T>,
}

/// the value is shared between readers of different threads => T: Sync too
unsafe impl<T> Sync for PriorityLock<T> where T: Send + Sync {}

impl<T> PriorityLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            counts: Mutex::new(Counts::default()),
            changed: Condvar::new(),
            value: UnsafeCell::new(value),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counts> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, counts: MutexGuard<'a, Counts>) -> MutexGuard<'a, Counts> {
        self.changed
            .wait(counts)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared access, blocks while a writer holds admission
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut counts = self.lock();
        counts.waiting_readers += 1;

        while counts.admission || counts.writer_inside {
            counts = self.wait(counts);
        }

        debug_assert!(!counts.writer_inside);
        counts.active_readers += 1;
        counts.waiting_readers -= 1;
        if counts.waiting_readers == 0 {
            // a writer may be holding back for this queue
            self.changed.notify_all();
        }
        ReadGuard { lock: self }
    }

    /// Exclusive access.
    ///
    /// Waits for the queued readers and any other writer first, then for the readers inside to leave.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut counts = self.lock();

        if counts.waiting_readers > 0 {
            debug!(
                waiting = counts.waiting_readers,
                "writer yields to queued readers"
            );
        }
        while counts.admission || counts.waiting_readers > 0 {
            counts = self.wait(counts);
        }
        counts.admission = true;

        // close the gate
        while counts.active_readers > 0 {
            counts = self.wait(counts);
        }
        debug_assert!(!counts.writer_inside);
        counts.writer_inside = true;
        WriteGuard { lock: self }
    }

    fn unlock_read(&self) {
        let mut counts = self.lock();
        counts.active_readers -= 1;
        if counts.active_readers == 0 {
            // the last reader opens the gate
            self.changed.notify_all();
        }
    }

    fn unlock_write(&self) {
        let mut counts = self.lock();
        // gate first, then admission
        counts.writer_inside = false;
        counts.admission = false;
        self.changed.notify_all();
    }

    pub fn state(&self) -> AccessState {
        let counts = self.lock();
        match (counts.writer_inside, counts.active_readers) {
            (true, _) => AccessState::Exclusive,
            (false, 0) => AccessState::Idle,
            (false, n) => AccessState::Shared(n),
        }
    }

    pub fn waiting_readers(&self) -> usize {
        self.lock().waiting_readers
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

pub struct ReadGuard<'a, T> {
    lock: &'a PriorityLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // SAFETY: no writer is inside while a read guard exists
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock_read();
    }
}

pub struct WriteGuard<'a, T> {
    lock: &'a PriorityLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // SAFETY: the write guard is the only way in while it exists
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: same as above
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock_write();
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering::SeqCst},
            Mutex,
        },
        thread::{scope, sleep},
        time::Duration,
    };

    use super::*;

    #[test]
    fn readers_share() {
        let lock = PriorityLock::new(5);
        let a = lock.read();
        let b = lock.read();
        assert_eq!(*a + *b, 10);
        assert_eq!(lock.state(), AccessState::Shared(2));
        drop(a);
        drop(b);
        assert_eq!(lock.state(), AccessState::Idle);

        *lock.write() += 1;
        assert_eq!(lock.into_inner(), 6);
    }

    #[test]
    fn writers_exclude_everybody() {
        let lock = PriorityLock::new((0u64, 0u64));
        let readers_inside = AtomicUsize::new(0);
        let writers_inside = AtomicUsize::new(0);

        scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let mut g = lock.write();
                        assert_eq!(writers_inside.fetch_add(1, SeqCst), 0);
                        assert_eq!(readers_inside.load(SeqCst), 0);
                        assert_eq!(lock.state(), AccessState::Exclusive);
                        // two halves of one record, a reader must never see them apart
                        g.0 += 1;
                        sleep(Duration::from_micros(20));
                        g.1 += 1;
                        writers_inside.fetch_sub(1, SeqCst);
                    }
                });
            }
            for _ in 0..4 {
                s.spawn(|| {
                    let mut last = 0;
                    for _ in 0..100 {
                        let g = lock.read();
                        readers_inside.fetch_add(1, SeqCst);
                        assert_eq!(writers_inside.load(SeqCst), 0);
                        assert_eq!(g.0, g.1);
                        assert!(g.0 >= last);
                        last = g.0;
                        readers_inside.fetch_sub(1, SeqCst);
                    }
                });
            }
        });

        assert_eq!(lock.into_inner(), (200, 200));
    }

    #[test]
    fn queued_readers_go_before_entering_writer() {
        let lock = PriorityLock::new(());
        let order = Mutex::new(Vec::new());

        scope(|s| {
            let first_writer = lock.write();

            for _ in 0..2 {
                s.spawn(|| {
                    let _g = lock.read();
                    order.lock().unwrap().push("reader");
                    sleep(Duration::from_millis(5));
                });
            }
            while lock.waiting_readers() < 2 {
                sleep(Duration::from_millis(1));
            }

            s.spawn(|| {
                let _g = lock.write();
                order.lock().unwrap().push("writer");
            });
            sleep(Duration::from_millis(20));

            drop(first_writer);
        });

        assert_eq!(
            order.into_inner().unwrap(),
            ["reader", "reader", "writer"]
        );
    }

    #[test]
    fn writer_waits_for_readers_inside() {
        let lock = PriorityLock::new(0);
        let guard = lock.read();

        scope(|s| {
            let writer = s.spawn(|| {
                *lock.write() = 1;
            });
            sleep(Duration::from_millis(10));
            // the writer took admission, but the gate is still held by the reader
            assert_eq!(lock.state(), AccessState::Shared(1));
            assert_eq!(*guard, 0);
            drop(guard);
            writer.join().unwrap();
        });

        assert_eq!(*lock.read(), 1);
    }
}
