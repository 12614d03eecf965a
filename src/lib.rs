pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod logbook;
pub mod primitives;
pub mod protocol;
pub mod roster;
pub mod run;
pub mod sink;
pub mod timing;
