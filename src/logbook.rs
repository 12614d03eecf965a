//! The shared log: one record per completed unit plus the running count.
//! It lives behind a [PriorityLock](crate::primitives::p3_priority_lock::PriorityLock), it has no locking of its own.

use crate::roster::{OperativeId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub unit: UnitId,
    pub leader: OperativeId,
    /// logical time of the write
    pub tick: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Logbook {
    records: Vec<CompletionRecord>,
    completed: usize,
}

impl Logbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: CompletionRecord) {
        debug_assert!(
            self.records.iter().all(|r| r.unit != record.unit),
            "unit {} written twice",
            record.unit
        );
        self.records.push(record);
        self.completed += 1;
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }
}
