//! Who is who: identities and the static assignment of operatives to units and stations.

use std::fmt;

use crate::config::Config;

/// Number of typewriting stations, K
pub const STATIONS: usize = 4;

/// 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperativeId(pub u32);

/// 0-based internally, shown 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub usize);

/// 0-based internally, shown as TS1..TS4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(pub usize);

/// 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub u32);

impl fmt::Display for OperativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS{}", self.0 + 1)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything about an operative is derived from its id and the unit size,
/// so there's no runtime election of leaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operative {
    pub id: OperativeId,
    pub unit: UnitId,
    pub station: StationId,
    /// the last member of the unit
    pub leader: bool,
}

impl Operative {
    pub fn new(id: u32, unit_size: u32) -> Self {
        debug_assert!(id >= 1 && unit_size >= 1);
        Self {
            id: OperativeId(id),
            unit: UnitId(((id - 1) / unit_size) as usize),
            station: StationId((id - 1) as usize % STATIONS),
            leader: id % unit_size == 0,
        }
    }
}

pub fn roster(config: &Config) -> Vec<Operative> {
    (1..=config.operatives)
        .map(|id| Operative::new(id, config.unit_size))
        .collect()
}
