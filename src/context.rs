//! # Coordination context
//!
//! The one place that owns every shared piece of a run: stations, unit barriers, the logbook, the clock and the sink.
//! It's created before any thread starts and borrowed by all of them through a thread scope,
//! so there're no globals and no reference counting.
//!
//! If the run can't start all of its threads, it's abandoned: every unit barrier lets its leader go
//! and observers stop at their next review, so the threads that did start can be joined.

use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

use tracing::warn;

use crate::{
    config::Config,
    event::{Event, Stamped},
    logbook::Logbook,
    primitives::{
        p1_station_arbiter::StationArbiter, p2_completion_barrier::CompletionBarrier,
        p3_priority_lock::PriorityLock,
    },
    roster::{UnitId, STATIONS},
    sink::EventSink,
    timing::{Clock, Timing},
};

pub struct Coordination<'s> {
    pub config: Config,
    pub timing: Timing,
    pub stations: StationArbiter,
    units: Vec<CompletionBarrier>,
    pub logbook: PriorityLock<Logbook>,
    pub clock: Clock,
    sink: &'s dyn EventSink,
    abandoned: AtomicBool,
}

impl<'s> Coordination<'s> {
    pub fn new(config: Config, timing: Timing, sink: &'s dyn EventSink) -> Self {
        let threshold = config.unit_size as usize;
        Self {
            config,
            timing,
            stations: StationArbiter::new(STATIONS),
            units: (0..config.unit_count())
                .map(|_| CompletionBarrier::new(threshold))
                .collect(),
            logbook: PriorityLock::new(Logbook::new()),
            clock: Clock::start(timing.tick),
            sink,
            abandoned: AtomicBool::new(false),
        }
    }

    /// # Panics
    /// - if there's no such unit
    pub fn unit(&self, unit: UnitId) -> &CompletionBarrier {
        &self.units[unit.0]
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// The run won't be complete, let everybody who waits for it go
    pub fn abandon(&self) {
        self.abandoned.store(true, Relaxed);
        for unit in &self.units {
            unit.abandon();
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Relaxed)
    }

    /// Stamps the event with the current logical time and hands it to the sink.
    /// A failing sink doesn't stop the run.
    pub fn emit(&self, event: Event) {
        let stamped = Stamped {
            at: self.clock.now(),
            event,
        };
        if let Err(error) = self.sink.emit(&stamped) {
            warn!(%error, kind = %event.kind(), "cannot write event");
        }
    }

    pub fn into_logbook(self) -> Logbook {
        self.logbook.into_inner()
    }
}
