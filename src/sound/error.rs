//! Sound system error types.
//!
//! Audio is best-effort: these errors are logged by the cue player and never
//! reach the timer.

use thiserror::Error;

/// Errors that can occur in the audio engine.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no output device, headless host).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Clip file was not found at the specified path.
    #[error("sound clip not found: {0}")]
    FileNotFound(String),

    /// Failed to decode a clip.
    #[error("failed to decode sound clip: {0}")]
    DecodeError(String),

    /// Failed to create or use the audio output stream.
    #[error("failed to open audio stream: {0}")]
    StreamError(String),

    /// Audio engine has not been unlocked yet.
    #[error("audio engine is locked until a user action unlocks it")]
    Locked,

    /// Generic playback error.
    #[error("sound playback error: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to a clip file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}
