//! Audio cue system for the Tabata timer.
//!
//! This module provides the audio feedback tied to the phase clock:
//!
//! - Tone cues rendered and offset on the audio engine's own clock
//! - Word clips decoded once and played after the tones
//! - A near-silent keepalive signal while a session runs
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ClockEvent   ┌──────────────┐
//! │  PhaseClock  │──────────────▶│  CuePlayer   │ ← what to play, when
//! └──────────────┘               └──────┬───────┘
//!                                       │ Tone / clip / keepalive
//!                                       ▼
//!                                ┌──────────────┐     ┌──────────────┐
//!                                │ AudioEngine  │────▶│ rodio output │
//!                                │   (trait)    │     │    stream    │
//!                                └──────────────┘     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use tabata::sound::{rodio_engine_factory, CuePlayer};
//! use tabata::timer::MonotonicTimeSource;
//! use std::sync::Arc;
//!
//! let mut cues = CuePlayer::new(rodio_engine_factory(None), Arc::new(MonotonicTimeSource));
//! // Must run inside the user action that starts the session.
//! cues.ensure_unlocked();
//! ```

mod cue;
mod embedded;
mod error;
mod player;
mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use cue::{
    Cue, CuePlayer, COMPLETE_CUE, COUNTDOWN_CUE, KEEPALIVE_RELEASE_DELAY, REST_START_CUE,
    WORK_START_CUE,
};
pub use embedded::{silent_keepalive_wav, KEEPALIVE_SAMPLE_RATE};
pub use error::SoundError;
pub use player::{rodio_engine_factory, RodioAudioEngine};
pub use source::{
    default_sounds_dir, discover_clips, ClipSource, DONE_CLIP, REST_CLIP, WORD_CLIPS,
    WORK_CLIP,
};

// ============================================================================
// Tone
// ============================================================================

/// A single sine tone of a cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Pitch in Hz
    pub frequency: f32,
    /// Time for the tone to decay to near silence
    pub duration: Duration,
    /// Start offset from the first tone of the cue
    pub offset: Duration,
    /// Peak gain (0.0-1.0)
    pub volume: f32,
}

impl Tone {
    /// Creates a tone from millisecond timings.
    pub const fn new(frequency: f32, duration_ms: u64, offset_ms: u64, volume: f32) -> Self {
        Self {
            frequency,
            duration: Duration::from_millis(duration_ms),
            offset: Duration::from_millis(offset_ms),
            volume,
        }
    }
}

// ============================================================================
// AudioEngine
// ============================================================================

/// The audio-graph handle the cue player drives.
///
/// Implementations must never block: scheduling returns as soon as the
/// sound is queued on the output.
pub trait AudioEngine {
    /// Establishes audio output and loads word clips.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot produce sound.
    fn unlock(&mut self) -> Result<(), SoundError>;

    /// Returns true once [`unlock`](Self::unlock) succeeded.
    fn is_unlocked(&self) -> bool;

    /// Queues the tones of one cue; offsets are relative to each other.
    ///
    /// # Errors
    ///
    /// Returns an error if the tones cannot be queued.
    fn schedule_tones(&mut self, tones: &[Tone]) -> Result<(), SoundError>;

    /// Plays a pre-decoded word clip.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip is unknown or playback fails.
    fn play_clip(&mut self, name: &str) -> Result<(), SoundError>;

    /// Starts (or continues) the keepalive signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be started.
    fn start_keepalive(&mut self) -> Result<(), SoundError>;

    /// Stops the keepalive signal if it is running.
    fn stop_keepalive(&mut self);
}

/// Lazily builds the audio engine on first unlock.
pub type EngineFactory = Box<dyn FnMut() -> Result<Box<dyn AudioEngine>, SoundError>>;

// ============================================================================
// MockAudioEngine
// ============================================================================

/// A call recorded by [`MockAudioEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Unlock,
    Tones(Vec<Tone>),
    Clip(String),
    KeepaliveStart,
    KeepaliveStop,
}

/// Mock audio engine for testing.
///
/// Clones share the same call log, so a test can keep one handle and give
/// another to the cue player.
#[derive(Debug, Clone, Default)]
pub struct MockAudioEngine {
    calls: Arc<Mutex<Vec<AudioCall>>>,
    unlocked: Arc<AtomicBool>,
    should_fail: Arc<AtomicBool>,
}

impl MockAudioEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Returns a factory handing out clones of this mock.
    #[must_use]
    pub fn factory(&self) -> EngineFactory {
        let engine = self.clone();
        Box::new(move || Ok(Box::new(engine.clone()) as Box<dyn AudioEngine>))
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of `schedule_tones` calls recorded.
    #[must_use]
    pub fn tone_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, AudioCall::Tones(_)))
            .count()
    }

    fn record(&self, call: AudioCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn check(&self) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if !self.unlocked.load(Ordering::SeqCst) {
            return Err(SoundError::Locked);
        }
        Ok(())
    }
}

impl AudioEngine for MockAudioEngine {
    fn unlock(&mut self) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::DeviceNotAvailable("Mock failure".to_string()));
        }
        self.unlocked.store(true, Ordering::SeqCst);
        self.record(AudioCall::Unlock);
        Ok(())
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    fn schedule_tones(&mut self, tones: &[Tone]) -> Result<(), SoundError> {
        self.check()?;
        self.record(AudioCall::Tones(tones.to_vec()));
        Ok(())
    }

    fn play_clip(&mut self, name: &str) -> Result<(), SoundError> {
        self.check()?;
        self.record(AudioCall::Clip(name.to_string()));
        Ok(())
    }

    fn start_keepalive(&mut self) -> Result<(), SoundError> {
        self.check()?;
        self.record(AudioCall::KeepaliveStart);
        Ok(())
    }

    fn stop_keepalive(&mut self) {
        self.record(AudioCall::KeepaliveStop);
    }
}
