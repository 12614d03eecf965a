use tracing::{debug, warn};

use crate::{
    context::Coordination,
    event::Event,
    logbook::CompletionRecord,
    primitives::p2_completion_barrier::Released,
    roster::Operative,
    timing::nap,
};

/// Drives one operative through its whole life. No retries: every wait ends once the peers make progress.
pub fn run(ctx: &Coordination, me: Operative) {
    let Operative {
        id,
        unit,
        station,
        leader,
    } = me;

    nap(ctx.timing.arrival_delay(&mut rand::thread_rng()));
    ctx.emit(Event::Arrived {
        operative: id,
        station,
    });

    let guard = ctx.stations.acquire(station, id, |_| {
        ctx.emit(Event::WaitingForStation {
            operative: id,
            station,
        })
    });
    ctx.emit(Event::StartedWork {
        operative: id,
        station,
    });
    nap(ctx.timing.work(ctx.config.station_work));
    ctx.emit(Event::FinishedWork { operative: id });
    guard.release();
    ctx.emit(Event::StationReleased {
        operative: id,
        station,
    });

    let barrier = ctx.unit(unit);
    let check_in = barrier.check_in(|| ctx.emit(Event::UnitComplete { unit }));
    debug!(operative = %id, %unit, ?check_in, "checked in");

    if !leader {
        return;
    }

    if barrier.wait() == Released::Abandoned {
        warn!(operative = %id, %unit, "unit abandoned, logbook left alone");
        return;
    }

    let mut book = ctx.logbook.write();
    nap(ctx.timing.work(ctx.config.log_work));
    book.append(CompletionRecord {
        unit,
        leader: id,
        tick: ctx.clock.now(),
    });
    ctx.emit(Event::LogbookWritten { unit, leader: id });
    debug!(%unit, completed = book.completed(), "logbook updated");
}
