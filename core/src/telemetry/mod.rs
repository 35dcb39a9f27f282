//! telemetry/mod.rs
//! Counters, stage timers and the immutable snapshot returned by stream calls.
//!
//! Counters are plain integers owned by one call; no atomics, no locks.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
