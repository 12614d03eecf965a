use tracing::debug;

use crate::{context::Coordination, event::Event, roster::ObserverId, timing::nap};

/// Reviews the logbook now and then until it has every unit or the run is abandoned.
///
/// The stop check uses the value read inside the read section, not a 2nd unlocked read,
/// so an observer that sees the final count always stops on that very pass.
/// Returns the number of reviews.
pub fn run(ctx: &Coordination, me: ObserverId) -> usize {
    let total = ctx.unit_count();
    let mut rng = rand::thread_rng();
    let mut reviews = 0;

    loop {
        nap(ctx.timing.observe_delay(&mut rng));

        let completed = {
            let book = ctx.logbook.read();
            let completed = book.completed();
            ctx.emit(Event::LogbookReviewed {
                observer: me,
                completed,
            });
            nap(ctx.timing.read_hold);
            completed
        };
        reviews += 1;
        debug_assert!(completed <= total);

        if completed >= total {
            debug!(observer = %me, reviews, "every unit is in the logbook");
            return reviews;
        }
        if ctx.is_abandoned() {
            debug!(observer = %me, reviews, completed, "run abandoned");
            return reviews;
        }
    }
}
