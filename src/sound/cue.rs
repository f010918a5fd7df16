//! Cue selection and scheduling.
//!
//! [`CuePlayer`] turns clock events into sounds. Tones go to the audio
//! engine straight away with their relative offsets; word clips and the
//! keepalive release are deferred and fired by [`CuePlayer::poll_deferred`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{DONE_CLIP, REST_CLIP, WORK_CLIP};
use super::{AudioEngine, EngineFactory, Tone};
use crate::timer::{ClockEvent, TimeSource};
use crate::types::Phase;

/// Seconds values that get a countdown beep.
const COUNTDOWN_SECONDS: std::ops::RangeInclusive<u32> = 1..=3;

/// How long the keepalive keeps running after a session completes.
pub const KEEPALIVE_RELEASE_DELAY: Duration = Duration::from_secs(3);

// ============================================================================
// Cue
// ============================================================================

/// A group of tones plus an optional word clip played after them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    /// Tones, offsets relative to the first one
    pub tones: &'static [Tone],
    /// Word clip name and its delay after the tones start
    pub word: Option<(&'static str, Duration)>,
}

/// Short beep for the last three seconds of a phase.
pub const COUNTDOWN_CUE: Cue = Cue {
    tones: &[Tone::new(660.0, 150, 0, 0.5)],
    word: None,
};

/// Ascending three-tone cue, then "work".
pub const WORK_START_CUE: Cue = Cue {
    tones: &[
        Tone::new(880.0, 150, 0, 0.6),
        Tone::new(880.0, 150, 200, 0.6),
        Tone::new(1100.0, 300, 400, 0.7),
    ],
    word: Some((WORK_CLIP, Duration::from_millis(800))),
};

/// Single low tone, then "rest".
pub const REST_START_CUE: Cue = Cue {
    tones: &[Tone::new(440.0, 500, 0, 0.5)],
    word: Some((REST_CLIP, Duration::from_millis(600))),
};

/// Four-tone fanfare, then "done".
pub const COMPLETE_CUE: Cue = Cue {
    tones: &[
        Tone::new(880.0, 200, 0, 0.5),
        Tone::new(1100.0, 200, 250, 0.5),
        Tone::new(1320.0, 200, 500, 0.5),
        Tone::new(1760.0, 500, 750, 0.7),
    ],
    word: Some((DONE_CLIP, Duration::from_millis(1400))),
};

// ============================================================================
// CuePlayer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredAction {
    Clip(&'static str),
    ReleaseKeepalive,
}

/// Plays audio feedback for clock events.
///
/// Audio is best-effort. Every engine failure is logged and dropped; none
/// of the methods here can fail.
pub struct CuePlayer {
    factory: EngineFactory,
    engine: Option<Box<dyn AudioEngine>>,
    time: Arc<dyn TimeSource>,
    /// Pending actions with their due time, in insertion order
    deferred: Vec<(Instant, DeferredAction)>,
    /// Last seconds value seen in the active phase
    last_countdown: Option<u32>,
    enabled: bool,
}

impl CuePlayer {
    /// Creates a player that builds its engine from `factory` on first
    /// unlock.
    pub fn new(factory: EngineFactory, time: Arc<dyn TimeSource>) -> Self {
        Self {
            factory,
            engine: None,
            time,
            deferred: Vec::new(),
            last_countdown: None,
            enabled: true,
        }
    }

    /// Creates a player that never makes a sound.
    pub fn disabled(time: Arc<dyn TimeSource>) -> Self {
        let factory: EngineFactory = Box::new(|| -> Result<Box<dyn AudioEngine>, SoundError> {
            Err(SoundError::DeviceNotAvailable("sound disabled".to_string()))
        });
        let mut player = Self::new(factory, time);
        player.enabled = false;
        player
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.on_stop();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true once an engine exists and is unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.engine.as_ref().is_some_and(|engine| engine.is_unlocked())
    }

    /// Creates and unlocks the engine, then starts the keepalive.
    ///
    /// Call this from the user action that starts a session. Safe to call
    /// repeatedly; a failed engine creation is retried on the next call.
    pub fn ensure_unlocked(&mut self) {
        if !self.enabled {
            return;
        }

        if self.engine.is_none() {
            match (self.factory)() {
                Ok(engine) => self.engine = Some(engine),
                Err(e) => {
                    report(&e, "audio engine unavailable");
                    return;
                }
            }
        }

        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if !engine.is_unlocked() {
            if let Err(e) = engine.unlock() {
                report(&e, "audio unlock failed");
                return;
            }
        }
        if let Err(e) = engine.start_keepalive() {
            report(&e, "keepalive failed to start");
        }
        // A new session keeps the keepalive it just started.
        self.deferred
            .retain(|(_, action)| *action != DeferredAction::ReleaseKeepalive);
    }

    /// Reacts to one clock event.
    pub fn handle(&mut self, event: &ClockEvent) {
        match *event {
            ClockEvent::PhaseChanged {
                phase,
                round,
                phase_duration,
            } => {
                self.last_countdown = Some(phase_duration);
                self.on_phase_enter(phase, round);
            }
            ClockEvent::Tick { seconds_left, .. } => self.on_countdown_tick(seconds_left),
            ClockEvent::Completed => self.on_complete(),
            ClockEvent::Stopped => self.on_stop(),
            ClockEvent::Paused | ClockEvent::Resumed { .. } => {}
        }
    }

    /// Plays the cue for entering `phase`.
    ///
    /// Prepare has no cue.
    pub fn on_phase_enter(&mut self, phase: Phase, round: u32) {
        let cue = match phase {
            Phase::Prepare => return,
            Phase::Work => WORK_START_CUE,
            Phase::Rest => REST_START_CUE,
        };
        debug!(phase = phase.as_str(), round, "phase cue");
        self.play(&cue);
    }

    /// Beeps when the countdown steps down into 3, 2 or 1.
    pub fn on_countdown_tick(&mut self, seconds_left: u32) {
        let stepped_down = self.last_countdown.is_none_or(|last| seconds_left < last);
        self.last_countdown = Some(seconds_left);

        if stepped_down && COUNTDOWN_SECONDS.contains(&seconds_left) {
            self.play(&COUNTDOWN_CUE);
        }
    }

    /// Plays the completion fanfare and schedules the keepalive release.
    pub fn on_complete(&mut self) {
        self.last_countdown = None;
        if !self.is_unlocked() {
            return;
        }
        self.play(&COMPLETE_CUE);
        let due = self.time.now() + KEEPALIVE_RELEASE_DELAY;
        self.deferred.push((due, DeferredAction::ReleaseKeepalive));
    }

    /// Drops pending word clips and releases the keepalive now.
    ///
    /// A stopped session goes silent at once, so a word already scheduled
    /// by the last phase cue is discarded rather than played late.
    pub fn on_stop(&mut self) {
        self.last_countdown = None;
        self.deferred.clear();
        if let Some(engine) = self.engine.as_mut() {
            engine.stop_keepalive();
        }
    }

    /// Fires every deferred action that is due.
    pub fn poll_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let now = self.time.now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.deferred.drain(..).partition(|(at, _)| *at <= now);
        self.deferred = pending;

        for (_, action) in due {
            match action {
                DeferredAction::Clip(name) => self.with_engine(|engine| engine.play_clip(name)),
                DeferredAction::ReleaseKeepalive => {
                    debug!("releasing keepalive");
                    if let Some(engine) = self.engine.as_mut() {
                        engine.stop_keepalive();
                    }
                }
            }
        }
    }

    /// Earliest due time among deferred actions.
    pub fn next_due(&self) -> Option<Instant> {
        self.deferred.iter().map(|(at, _)| *at).min()
    }

    pub fn has_pending(&self) -> bool {
        !self.deferred.is_empty()
    }

    fn play(&mut self, cue: &Cue) {
        if !self.is_unlocked() {
            return;
        }
        self.with_engine(|engine| engine.schedule_tones(cue.tones));
        if let Some((name, delay)) = cue.word {
            let due = self.time.now() + delay;
            self.deferred.push((due, DeferredAction::Clip(name)));
        }
    }

    fn with_engine<F>(&mut self, f: F)
    where
        F: FnOnce(&mut dyn AudioEngine) -> Result<(), SoundError>,
    {
        if !self.enabled {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Err(e) = f(engine.as_mut()) {
            report(&e, "cue playback failed");
        }
    }
}

impl fmt::Debug for CuePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuePlayer")
            .field("enabled", &self.enabled)
            .field("unlocked", &self.is_unlocked())
            .field("deferred", &self.deferred.len())
            .field("last_countdown", &self.last_countdown)
            .finish_non_exhaustive()
    }
}

fn report(error: &SoundError, context: &str) {
    if error.is_device_error() {
        warn!("{}: {}", context, error);
    } else {
        debug!("{}: {}", context, error);
    }
}
