//! # Event sinks
//!
//! Where the human-readable lines of a run go.
//! Every sink serializes its own writes, so lines never interleave,
//! but two racing events may land in either order.

use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use crate::event::Stamped;

pub trait EventSink: Send + Sync {
    fn emit(&self, stamped: &Stamped) -> io::Result<()>;
}

/// Writes one line per event and flushes right away
pub struct LineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for LineSink<W> {
    fn emit(&self, stamped: &Stamped) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{stamped}")?;
        out.flush()
    }
}

/// Keeps the events in emission order
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Stamped>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Stamped> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, stamped: &Stamped) -> io::Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*stamped);
        Ok(())
    }
}

/// Sends every event to both sinks, the first error wins
pub struct Tee<'a> {
    first: &'a dyn EventSink,
    second: &'a dyn EventSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn EventSink, second: &'a dyn EventSink) -> Self {
        Self { first, second }
    }
}

impl EventSink for Tee<'_> {
    fn emit(&self, stamped: &Stamped) -> io::Result<()> {
        let first = self.first.emit(stamped);
        let second = self.second.emit(stamped);
        first.and(second)
    }
}
