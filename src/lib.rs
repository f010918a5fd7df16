//! Tabata Timer Library
//!
//! This library provides the core functionality for the Tabata timer CLI.
//! It includes:
//! - Phase clock: a deadline-based countdown that survives suspensions
//!   and pause/resume without drift
//! - Cue player: tones, word clips and the audio keepalive
//! - Session runner: the single-task event loop tying both together
//! - Preset storage
//! - CLI command parsing and display utilities
//! - Type definitions for configuration and clock state

pub mod cli;
pub mod presets;
pub mod session;
pub mod sound;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{ClockSnapshot, ConfigField, ControlState, Phase, SessionConfig};

// Re-export the clock
pub use timer::{
    ClockEvent, ManualTimeSource, MonotonicTimeSource, PhaseClock, TimeSource,
    REEVALUATE_INTERVAL,
};

// Re-export sound types
pub use sound::{
    rodio_engine_factory, AudioEngine, CuePlayer, MockAudioEngine, RodioAudioEngine, SoundError,
};

// Re-export session and preset types
pub use presets::{Preset, PresetError, PresetStore};
pub use session::{Control, SessionObserver, SessionOutcome, SessionRunner};
