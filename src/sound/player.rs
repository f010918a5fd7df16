//! Audio engine implementation using rodio.
//!
//! Tones are synthesized (sine + exponential decay) and mixed into a single
//! source per cue, so their relative offsets are counted in output samples
//! rather than in timer callbacks.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::dynamic_mixer;
use rodio::source::{Buffered, SineWave};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::embedded::silent_keepalive_wav;
use super::error::SoundError;
use super::source::{default_sounds_dir, discover_clips};
use super::{AudioEngine, EngineFactory, Tone};

/// A word clip decoded once and replayed from memory.
type DecodedClip = Buffered<Decoder<Cursor<Vec<u8>>>>;

/// Sample rate of the per-cue tone mixer.
const TONE_SAMPLE_RATE: u32 = 48_000;

/// Extra time a tone keeps sounding after its decay.
const TONE_TAIL: Duration = Duration::from_millis(50);

/// Gain a tone decays to.
const DECAY_FLOOR: f32 = 0.001;

/// Output volume of the keepalive sink.
const KEEPALIVE_VOLUME: f32 = 0.01;

// ============================================================================
// DecayEnvelope
// ============================================================================

/// Exponential decay from a peak gain to [`DECAY_FLOOR`], then held.
struct DecayEnvelope<S> {
    inner: S,
    gain: f32,
    factor: f32,
}

impl<S> DecayEnvelope<S>
where
    S: Source<Item = f32>,
{
    fn new(inner: S, volume: f32, decay: Duration) -> Self {
        let samples = (decay.as_secs_f32()
            * inner.sample_rate() as f32
            * f32::from(inner.channels()))
        .max(1.0);
        let volume = volume.max(DECAY_FLOOR);
        let factor = (DECAY_FLOOR / volume).powf(1.0 / samples);
        Self {
            inner,
            gain: volume,
            factor,
        }
    }
}

impl<S> Iterator for DecayEnvelope<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        let out = sample * self.gain;
        self.gain = (self.gain * self.factor).max(DECAY_FLOOR);
        Some(out)
    }
}

impl<S> Source for DecayEnvelope<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Renders one tone, silent until its offset.
fn render_tone(tone: &Tone) -> impl Source<Item = f32> + Send + 'static {
    let wave = SineWave::new(tone.frequency).take_duration(tone.duration + TONE_TAIL);
    DecayEnvelope::new(wave, tone.volume, tone.duration).delay(tone.offset)
}

/// Reads and fully decodes a clip file.
fn decode_clip(path: &Path) -> Result<DecodedClip, SoundError> {
    let bytes = std::fs::read(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| SoundError::DecodeError(format!("{}: {}", path.display(), e)))?;
    Ok(decoder.buffered())
}

// ============================================================================
// RodioAudioEngine
// ============================================================================

/// An audio engine that uses rodio for output.
///
/// Playback is non-blocking; every sound is queued on the output stream's
/// mixer and plays in the background.
pub struct RodioAudioEngine {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for queuing sources.
    stream_handle: OutputStreamHandle,
    /// Where word clips are looked up on unlock.
    sounds_dir: Option<PathBuf>,
    /// Word clips keyed by name.
    clips: HashMap<String, DecodedClip>,
    /// Sink looping the keepalive signal.
    keepalive: Option<Sink>,
    unlocked: bool,
}

impl RodioAudioEngine {
    /// Opens the default output device.
    ///
    /// # Arguments
    ///
    /// * `sounds_dir` - Directory holding word clips; the platform data
    ///   directory is used when `None`.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(sounds_dir: Option<PathBuf>) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sounds_dir: sounds_dir.or_else(default_sounds_dir),
            clips: HashMap::new(),
            keepalive: None,
            unlocked: false,
        })
    }

    /// Names of the clips decoded so far.
    #[must_use]
    pub fn loaded_clips(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn load_clips(&mut self) {
        let Some(dir) = self.sounds_dir.as_deref() else {
            debug!("No sounds directory, word cues disabled");
            return;
        };
        for clip in discover_clips(dir) {
            match decode_clip(&clip.path) {
                Ok(decoded) => {
                    debug!("Decoded word clip '{}'", clip.name);
                    self.clips.insert(clip.name, decoded);
                }
                Err(e) => warn!("Skipping word clip '{}': {}", clip.name, e),
            }
        }
    }
}

impl AudioEngine for RodioAudioEngine {
    fn unlock(&mut self) -> Result<(), SoundError> {
        if self.unlocked {
            return Ok(());
        }
        self.load_clips();
        self.unlocked = true;
        debug!(clips = self.clips.len(), "Audio engine unlocked");
        Ok(())
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    fn schedule_tones(&mut self, tones: &[Tone]) -> Result<(), SoundError> {
        if !self.unlocked {
            return Err(SoundError::Locked);
        }
        if tones.is_empty() {
            return Ok(());
        }

        let (controller, mixer) = dynamic_mixer::mixer::<f32>(1, TONE_SAMPLE_RATE);
        for tone in tones {
            controller.add(render_tone(tone));
        }
        self.stream_handle
            .play_raw(mixer)
            .map_err(|e| SoundError::PlaybackError(e.to_string()))?;

        debug!(count = tones.len(), "Tones queued");
        Ok(())
    }

    fn play_clip(&mut self, name: &str) -> Result<(), SoundError> {
        if !self.unlocked {
            return Err(SoundError::Locked);
        }
        let clip = self
            .clips
            .get(name)
            .cloned()
            .ok_or_else(|| SoundError::FileNotFound(format!("word clip '{}'", name)))?;

        self.stream_handle
            .play_raw(clip.convert_samples::<f32>())
            .map_err(|e| SoundError::PlaybackError(e.to_string()))?;

        debug!("Word clip '{}' queued", name);
        Ok(())
    }

    fn start_keepalive(&mut self) -> Result<(), SoundError> {
        if let Some(sink) = &self.keepalive {
            sink.play();
            return Ok(());
        }

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;
        let signal = Decoder::new(Cursor::new(silent_keepalive_wav()))
            .map_err(|e| SoundError::DecodeError(format!("keepalive signal: {}", e)))?;

        sink.set_volume(KEEPALIVE_VOLUME);
        sink.append(signal.repeat_infinite());
        self.keepalive = Some(sink);

        debug!("Keepalive started");
        Ok(())
    }

    fn stop_keepalive(&mut self) {
        if let Some(sink) = self.keepalive.take() {
            sink.stop();
            debug!("Keepalive stopped");
        }
    }
}

impl fmt::Debug for RodioAudioEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioAudioEngine")
            .field("sounds_dir", &self.sounds_dir)
            .field("clips", &self.loaded_clips())
            .field("keepalive", &self.keepalive.is_some())
            .field("unlocked", &self.unlocked)
            .finish_non_exhaustive()
    }
}

/// Returns a factory that opens a [`RodioAudioEngine`] on first use.
#[must_use]
pub fn rodio_engine_factory(sounds_dir: Option<PathBuf>) -> EngineFactory {
    Box::new(move || {
        RodioAudioEngine::new(sounds_dir.clone())
            .map(|engine| Box::new(engine) as Box<dyn AudioEngine>)
    })
}
