//! # Thread protocols
//!
//! What each kind of thread does from start to finish:
//! - [operative] - arrive, take the station, work, free it, check in, and, for the leader, write the logbook
//! - [observer] - nap, review the logbook as a reader, repeat until every unit is accounted for
//!
//! Every step emits exactly one event through the [Coordination](crate::context::Coordination).

pub mod observer;
pub mod operative;
