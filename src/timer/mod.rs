//! Timer module for the Tabata timer.
//!
//! This module contains the session state machine:
//! - `clock`: `PhaseClock` with deadline-based countdown and pause banking
//! - `schedule`: pure mapping from elapsed session time to phase and round
//! - `event`: events emitted to cue players and renderers
//! - `time_source`: injectable "now" for deterministic tests

pub mod clock;
pub mod event;
pub mod schedule;
pub mod time_source;

pub use clock::{PhaseClock, REEVALUATE_INTERVAL};
pub use event::{ClockEvent, Subscribers};
pub use schedule::{Schedule, Slot};
pub use time_source::{ManualTimeSource, MonotonicTimeSource, TimeSource};
