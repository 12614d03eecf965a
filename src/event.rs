//! Observable transitions of a run, one output line each.

use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

use crate::roster::{ObserverId, OperativeId, StationId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Arrived {
        operative: OperativeId,
        station: StationId,
    },
    /// the station was taken when the operative asked for it
    WaitingForStation {
        operative: OperativeId,
        station: StationId,
    },
    StartedWork {
        operative: OperativeId,
        station: StationId,
    },
    FinishedWork {
        operative: OperativeId,
    },
    StationReleased {
        operative: OperativeId,
        station: StationId,
    },
    UnitComplete {
        unit: UnitId,
    },
    LogbookWritten {
        unit: UnitId,
        leader: OperativeId,
    },
    LogbookReviewed {
        observer: ObserverId,
        completed: usize,
    },
}

/// Payload-free twin of [Event]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Arrived,
    WaitingForStation,
    StartedWork,
    FinishedWork,
    StationReleased,
    UnitComplete,
    LogbookWritten,
    LogbookReviewed,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Arrived { .. } => EventKind::Arrived,
            Event::WaitingForStation { .. } => EventKind::WaitingForStation,
            Event::StartedWork { .. } => EventKind::StartedWork,
            Event::FinishedWork { .. } => EventKind::FinishedWork,
            Event::StationReleased { .. } => EventKind::StationReleased,
            Event::UnitComplete { .. } => EventKind::UnitComplete,
            Event::LogbookWritten { .. } => EventKind::LogbookWritten,
            Event::LogbookReviewed { .. } => EventKind::LogbookReviewed,
        }
    }
}

/// An event with the logical time it happened at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped {
    pub at: u64,
    pub event: Event,
}

/// The line format: actor, action, time
impl fmt::Display for Stamped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at;
        match self.event {
            Event::Arrived { operative, station } => write!(
                f,
                "Operative {operative} has arrived at typewriting station {station} at time {at}"
            ),
            Event::WaitingForStation { operative, station } => write!(
                f,
                "Operative {operative} is waiting for station {station} at time {at}"
            ),
            Event::StartedWork { operative, station } => write!(
                f,
                "Operative {operative} has started document recreation at station {station} at time {at}"
            ),
            Event::FinishedWork { operative } => write!(
                f,
                "Operative {operative} has completed document recreation at time {at}"
            ),
            Event::StationReleased { operative, station } => write!(
                f,
                "Operative {operative} has released station {station} at time {at}"
            ),
            Event::UnitComplete { unit } => write!(
                f,
                "Unit {unit} has completed document recreation phase at time {at}"
            ),
            Event::LogbookWritten { unit, leader } => write!(
                f,
                "Unit {unit} has completed intelligence distribution (leader {leader}) at time {at}"
            ),
            Event::LogbookReviewed {
                observer,
                completed,
            } => write!(
                f,
                "Intelligence Staff {observer} began reviewing logbook at time {at}. Operations completed = {completed}"
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn formats_lines() {
        let line = Stamped {
            at: 7,
            event: Event::Arrived {
                operative: OperativeId(3),
                station: StationId(2),
            },
        };
        assert_eq!(
            line.to_string(),
            "Operative 3 has arrived at typewriting station TS3 at time 7"
        );

        let line = Stamped {
            at: 12,
            event: Event::UnitComplete { unit: UnitId(1) },
        };
        assert_eq!(
            line.to_string(),
            "Unit 2 has completed document recreation phase at time 12"
        );
    }

    #[test]
    fn kinds_round_trip_by_name() {
        for kind in EventKind::iter() {
            assert_eq!(EventKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(EventKind::UnitComplete.to_string(), "unit_complete");
    }
}
