//! # Timing
//!
//! All the sleeps of a run and the logical clock.
//!
//! Random delays are drawn from a Poisson distribution with a large mean and reduced modulo the range,
//! so they're spread roughly evenly over `1..=range`.

use std::{
    sync::LazyLock,
    thread,
    time::{Duration, Instant},
};

use rand::Rng;
use rand_distr::{Distribution, Poisson};

const POISSON_MEAN: f64 = 1000.0;
static POISSON: LazyLock<Poisson<f64>> =
    LazyLock::new(|| Poisson::new(POISSON_MEAN).expect("the mean is positive and finite"));
/// arrival delay is 1..=ARRIVAL_STEPS arrival steps
pub const ARRIVAL_STEPS: u64 = 20;
/// observer naps for 1..=OBSERVE_STEPS observe steps
pub const OBSERVE_STEPS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// one configured work unit
    pub work_unit: Duration,
    pub arrival_step: Duration,
    /// gap between launching consecutive operatives
    pub spawn_stagger: Duration,
    pub observe_step: Duration,
    /// how long an observer stays inside the read section
    pub read_hold: Duration,
    /// resolution of the logical timestamp
    pub tick: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            work_unit: Duration::from_secs(1),
            arrival_step: Duration::from_millis(1),
            spawn_stagger: Duration::from_millis(100),
            observe_step: Duration::from_secs(1),
            read_hold: Duration::from_millis(500),
            tick: Duration::from_millis(100),
        }
    }
}

impl Timing {
    /// Same proportions in a few milliseconds, for tests and dry runs.
    pub fn compressed() -> Self {
        Self {
            work_unit: Duration::from_millis(4),
            arrival_step: Duration::from_micros(50),
            spawn_stagger: Duration::from_micros(200),
            observe_step: Duration::from_millis(1),
            read_hold: Duration::from_micros(500),
            tick: Duration::from_millis(1),
        }
    }

    /// Saturates instead of overflowing on absurd settings
    pub fn work(&self, units: u32) -> Duration {
        scale(self.work_unit, units)
    }

    pub fn arrival_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        scale(self.arrival_step, spread(rng, ARRIVAL_STEPS))
    }

    pub fn observe_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        scale(self.observe_step, spread(rng, OBSERVE_STEPS))
    }
}

fn scale(step: Duration, times: u32) -> Duration {
    step.checked_mul(times).unwrap_or(Duration::MAX)
}

/// 1..=range
fn spread<R: Rng + ?Sized>(rng: &mut R, range: u64) -> u32 {
    let drawn: f64 = POISSON.sample(rng);
    (drawn as u64 % range + 1) as u32
}

pub fn nap(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Measures the run in whole ticks since it started
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
    tick: Duration,
}

impl Clock {
    pub fn start(tick: Duration) -> Self {
        Self {
            start: Instant::now(),
            tick,
        }
    }

    pub fn now(&self) -> u64 {
        let tick = self.tick.as_nanos().max(1);
        (self.start.elapsed().as_nanos() / tick) as u64
    }
}
