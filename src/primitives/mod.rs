//! # Coordination primitives
//!
//! Three blocking tools the protocols are built from:
//! - [p1_station_arbiter] - exclusive use of one of a few stations, a mutex + condvar per station
//! - [p2_completion_barrier] - a single-use latch that opens when the last member of a unit checks in
//! - [p3_priority_lock] - many readers or one writer, where readers that already queued go before an entering writer
//!
//! None of them can fail, they only block. All of them are built on the std `Mutex` and `Condvar`.
//! Condvars can wake spuriously, so every wait sits in a loop that re-checks its condition under the mutex.
//!
//! ## Poisoning
//! A std mutex gets poisoned if its holder panics. Here the state behind every mutex stays consistent
//! (each update is a single assignment), and a panicking thread takes the whole scoped run down on join anyway.
//! So the poison is stripped with [`PoisonError::into_inner`](std::sync::PoisonError::into_inner) instead of unwrapping.

pub mod p1_station_arbiter;
pub mod p2_completion_barrier;
pub mod p3_priority_lock;
