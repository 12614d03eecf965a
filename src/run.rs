//! # Run
//!
//! Builds the [Coordination], starts the observers, then the operatives one after another,
//! and waits for all of them in a single thread scope.
//! If any thread panics, the scope re-raises it here.
//!
//! If the OS refuses to start a thread, the run is abandoned so the threads already running can finish,
//! and the spawn error is returned once they're joined.

use std::{
    collections::HashMap,
    thread::{self, Scope},
};

use strum::IntoEnumIterator;
use tracing::{error, info};

use crate::{
    config::Config,
    context::Coordination,
    error::Error,
    event::{EventKind, Stamped},
    logbook::Logbook,
    protocol::{observer, operative},
    roster::{roster, ObserverId, Operative},
    sink::{EventSink, MemorySink, Tee},
    timing::{nap, Timing},
};

pub const DEFAULT_OBSERVERS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub observers: u32,
    pub timing: Timing,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            observers: DEFAULT_OBSERVERS,
            timing: Timing::default(),
        }
    }
}

/// What a finished run leaves behind
#[derive(Debug, Clone)]
pub struct RunReport {
    pub logbook: Logbook,
    /// every event in emission order
    pub events: Vec<Stamped>,
}

impl RunReport {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .iter()
            .filter(|e| e.event.kind() == kind)
            .count()
    }

    pub fn summary(&self) -> HashMap<EventKind, usize> {
        EventKind::iter()
            .map(|kind| (kind, self.count(kind)))
            .collect()
    }
}

pub fn run(
    config: &Config,
    options: &RunOptions,
    sink: &dyn EventSink,
) -> Result<RunReport, Error> {
    let memory = MemorySink::new();
    let tee = Tee::new(sink, &memory);
    let ctx = Coordination::new(*config, options.timing, &tee);
    info!(
        operatives = config.operatives,
        unit_size = config.unit_size,
        units = ctx.unit_count(),
        observers = options.observers,
        "run starting"
    );

    thread::scope(|s| {
        let launched = launch(s, &ctx, options, roster(config));
        settle(&ctx, launched)
    })?;

    let logbook = ctx.into_logbook();
    info!(completed = logbook.completed(), "run finished");
    Ok(RunReport {
        logbook,
        events: memory.events(),
    })
}

/// Starts the observers, then the operatives. Stops at the first thread the OS refuses.
fn launch<'scope, 'env>(
    s: &'scope Scope<'scope, 'env>,
    ctx: &'env Coordination<'env>,
    options: &RunOptions,
    operatives: impl IntoIterator<Item = Operative>,
) -> Result<(), Error> {
    for n in 1..=options.observers {
        let me = ObserverId(n);
        thread::Builder::new()
            .name(format!("observer-{n}"))
            .spawn_scoped(s, move || observer::run(ctx, me))
            .map_err(Error::Spawn)?;
    }
    for me in operatives {
        thread::Builder::new()
            .name(format!("operative-{}", me.id))
            .spawn_scoped(s, move || operative::run(ctx, me))
            .map_err(Error::Spawn)?;
        nap(options.timing.spawn_stagger);
    }
    Ok(())
}

/// A partial launch can never complete every unit => let the started threads go
fn settle(ctx: &Coordination, launched: Result<(), Error>) -> Result<(), Error> {
    if let Err(e) = &launched {
        error!(error = %e, "abandoning the run");
        ctx.abandon();
    }
    launched
}

#[cfg(test)]
mod test {
    use std::{collections::HashSet, io};

    use crate::{
        event::Event,
        roster::{Operative, OperativeId, StationId, UnitId, STATIONS},
        sink::LineSink,
    };

    use super::*;

    fn quick(observers: u32) -> RunOptions {
        RunOptions {
            observers,
            timing: Timing::compressed(),
        }
    }

    fn position(report: &RunReport, wanted: Event) -> usize {
        report
            .events
            .iter()
            .position(|e| e.event == wanted)
            .unwrap_or_else(|| panic!("{wanted:?} never happened"))
    }

    #[test]
    fn two_units_of_four() {
        let config = Config::parse("8 4 1 1").unwrap();
        let out = LineSink::new(Vec::new());
        let report = run(&config, &quick(2), &out).unwrap();

        assert_eq!(report.count(EventKind::Arrived), 8);
        assert_eq!(report.count(EventKind::StartedWork), 8);
        assert_eq!(report.count(EventKind::UnitComplete), 2);
        assert_eq!(report.count(EventKind::LogbookWritten), 2);

        let leaders: HashSet<OperativeId> =
            report.logbook.records().iter().map(|r| r.leader).collect();
        assert_eq!(leaders, HashSet::from([OperativeId(4), OperativeId(8)]));
        assert_eq!(report.logbook.completed(), 2);

        for (unit, leader) in [(UnitId(0), OperativeId(4)), (UnitId(1), OperativeId(8))] {
            assert!(
                position(&report, Event::UnitComplete { unit })
                    < position(&report, Event::LogbookWritten { unit, leader })
            );
        }

        // stations cycle TS1..TS4 twice
        for i in 0..8 {
            let started = Event::StartedWork {
                operative: OperativeId(i as u32 + 1),
                station: StationId(i % STATIONS),
            };
            assert!(report.events.iter().any(|e| e.event == started));
        }

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text.lines().count(), report.events.len());
        assert_eq!(
            text.lines()
                .filter(|l| l.contains("has completed intelligence distribution"))
                .count(),
            2
        );
    }

    #[test]
    fn single_unit() {
        let config = Config::parse("4 4 1 1").unwrap();
        let report = run(&config, &quick(1), &MemorySink::new()).unwrap();
        assert_eq!(report.count(EventKind::LogbookWritten), 1);
        assert_eq!(report.logbook.completed(), 1);
        assert_eq!(report.logbook.records()[0].leader, OperativeId(4));
    }

    #[test]
    fn station_never_has_two_holders() {
        let config = Config::parse("16 4 1 1").unwrap();
        let report = run(&config, &quick(0), &MemorySink::new()).unwrap();

        // replay starts and finishes per station, both are emitted while holding it
        let mut held: HashMap<StationId, OperativeId> = HashMap::new();
        for e in &report.events {
            match e.event {
                Event::StartedWork { operative, station } => {
                    let previous = held.insert(station, operative);
                    assert!(previous.is_none(), "{station} taken twice");
                }
                Event::FinishedWork { operative } => {
                    let station = Operative::new(operative.0, config.unit_size).station;
                    assert_eq!(held.remove(&station), Some(operative));
                }
                _ => {}
            }
        }
        assert!(held.is_empty());
    }

    #[test]
    fn counter_never_goes_back() {
        let config = Config::parse("12 3 1 1").unwrap();
        let report = run(&config, &quick(3), &MemorySink::new()).unwrap();

        let mut written = 0;
        for e in &report.events {
            match e.event {
                Event::LogbookWritten { .. } => written += 1,
                // the review line is emitted inside the read section, no write can sneak in between
                Event::LogbookReviewed { completed, .. } => assert_eq!(completed, written),
                _ => {}
            }
        }
        assert_eq!(written, 4);

        let units: HashSet<UnitId> = report.logbook.records().iter().map(|r| r.unit).collect();
        assert_eq!(units.len(), 4);
        let records = report.logbook.records();
        assert!(records.windows(2).all(|w| w[0].tick <= w[1].tick));
    }

    #[test]
    fn observers_see_the_final_count() {
        let config = Config::parse("4 2 1 1").unwrap();
        let report = run(&config, &quick(2), &MemorySink::new()).unwrap();
        for n in 1..=2 {
            let last = report
                .events
                .iter()
                .rev()
                .find_map(|e| match e.event {
                    Event::LogbookReviewed {
                        observer,
                        completed,
                    } if observer == ObserverId(n) => Some(completed),
                    _ => None,
                });
            assert_eq!(last, Some(2));
        }
        let summary = report.summary();
        assert_eq!(summary[&EventKind::UnitComplete], 2);
        assert_eq!(summary.len(), EventKind::iter().count());
    }

    #[test]
    fn unit_size_one() {
        let config = Config::parse("5 1 1 1").unwrap();
        let report = run(&config, &quick(1), &MemorySink::new()).unwrap();
        assert_eq!(report.count(EventKind::UnitComplete), 5);
        assert_eq!(report.logbook.completed(), 5);
    }

    #[test]
    fn refused_thread_abandons_the_run() {
        let config = Config::parse("8 4 1 1").unwrap();
        let sink = MemorySink::new();
        let ctx = Coordination::new(config, Timing::compressed(), &sink);

        // operative 8 never gets a thread, so unit 2 can't complete
        let partial: Vec<Operative> = roster(&config).into_iter().take(7).collect();
        let outcome = thread::scope(|s| {
            launch(s, &ctx, &quick(2), partial).unwrap();
            while ctx.logbook.read().completed() == 0 {
                thread::sleep(std::time::Duration::from_millis(1));
            }
            settle(&ctx, Err(Error::Spawn(io::Error::other("no more threads"))))
        });

        assert!(matches!(outcome, Err(Error::Spawn(_))));
        assert!(ctx.is_abandoned());
        assert!(ctx.unit(UnitId(0)).is_fired());
        assert!(!ctx.unit(UnitId(1)).is_fired());
        assert_eq!(ctx.logbook.read().completed(), 1);
        let written = sink
            .events()
            .iter()
            .filter(|e| e.event.kind() == EventKind::LogbookWritten)
            .count();
        assert_eq!(written, 1);
    }
}
