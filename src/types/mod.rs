//! Core data types for the Tabata timer.
//!
//! This module defines the data structures used for:
//! - Session configuration with bounds and stepper adjustment
//! - Phase and control state of the phase clock
//! - Read-only snapshots handed to rendering collaborators

use serde::{Deserialize, Serialize};

// ============================================================================
// Phase
// ============================================================================

/// A timed segment of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Count-in before the first round
    Prepare,
    /// Effort interval of a round
    Work,
    /// Recovery interval of a round
    Rest,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Work => "work",
            Phase::Rest => "rest",
        }
    }

    /// Returns the upper-case label shown on screen.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Prepare => "PREPARE",
            Phase::Work => "WORK",
            Phase::Rest => "REST",
        }
    }
}

// ============================================================================
// ControlState
// ============================================================================

/// Lifecycle state of the phase clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// No session in progress
    #[default]
    Idle,
    /// Counting down the active phase
    Running,
    /// Remaining time is banked
    Paused,
    /// All rounds finished
    Complete,
}

impl ControlState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlState::Idle => "idle",
            ControlState::Running => "running",
            ControlState::Paused => "paused",
            ControlState::Complete => "complete",
        }
    }

    /// Returns true if a phase is active (running or paused).
    pub fn has_phase(&self) -> bool {
        matches!(self, ControlState::Running | ControlState::Paused)
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Allowed work duration in seconds.
pub const WORK_SECONDS_RANGE: (u32, u32) = (5, 300);
/// Allowed rest duration in seconds.
pub const REST_SECONDS_RANGE: (u32, u32) = (5, 300);
/// Allowed number of rounds.
pub const ROUNDS_RANGE: (u32, u32) = (1, 99);
/// Allowed prepare duration in seconds.
pub const PREPARE_SECONDS_RANGE: (u32, u32) = (0, 60);

/// A field of [`SessionConfig`] that can be stepped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Work,
    Rest,
    Rounds,
    Prepare,
}

impl ConfigField {
    /// Returns the inclusive `(min, max)` bounds of this field.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            ConfigField::Work => WORK_SECONDS_RANGE,
            ConfigField::Rest => REST_SECONDS_RANGE,
            ConfigField::Rounds => ROUNDS_RANGE,
            ConfigField::Prepare => PREPARE_SECONDS_RANGE,
        }
    }
}

/// Configuration for one workout session.
///
/// Bounds are enforced here and by the CLI before a config reaches the
/// phase clock; the clock itself trusts what it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Work duration in seconds (5-300)
    pub work_seconds: u32,
    /// Rest duration in seconds (5-300)
    pub rest_seconds: u32,
    /// Number of work/rest rounds (1-99)
    pub rounds: u32,
    /// Prepare duration in seconds (0-60)
    pub prepare_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_seconds: 20,
            rest_seconds: 10,
            rounds: 8,
            prepare_seconds: 10,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_seconds(mut self, seconds: u32) -> Self {
        self.work_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified rest duration.
    pub fn with_rest_seconds(mut self, seconds: u32) -> Self {
        self.rest_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified number of rounds.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Creates a new configuration with the specified prepare duration.
    pub fn with_prepare_seconds(mut self, seconds: u32) -> Self {
        self.prepare_seconds = seconds;
        self
    }

    /// Total session length: prepare plus every work/rest round.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.prepare_seconds)
            + u64::from(self.rounds) * (u64::from(self.work_seconds) + u64::from(self.rest_seconds))
    }

    /// Returns the current value of a field.
    pub fn get(&self, field: ConfigField) -> u32 {
        match field {
            ConfigField::Work => self.work_seconds,
            ConfigField::Rest => self.rest_seconds,
            ConfigField::Rounds => self.rounds,
            ConfigField::Prepare => self.prepare_seconds,
        }
    }

    /// Applies a stepper delta to a field, clamping into its bounds.
    pub fn adjust(&mut self, field: ConfigField, delta: i64) {
        let (min, max) = field.bounds();
        let next = (i64::from(self.get(field)) + delta).clamp(i64::from(min), i64::from(max));
        // clamped into u32 bounds above
        let next = next as u32;
        match field {
            ConfigField::Work => self.work_seconds = next,
            ConfigField::Rest => self.rest_seconds = next,
            ConfigField::Rounds => self.rounds = next,
            ConfigField::Prepare => self.prepare_seconds = next,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            (ConfigField::Work, "Work duration", "s"),
            (ConfigField::Rest, "Rest duration", "s"),
            (ConfigField::Rounds, "Rounds", ""),
            (ConfigField::Prepare, "Prepare duration", "s"),
        ];
        for (field, name, unit) in checks {
            let (min, max) = field.bounds();
            let value = self.get(field);
            if value < min || value > max {
                return Err(format!(
                    "{} must be between {}{} and {}{} (got {})",
                    name, min, unit, max, unit, value
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// ClockSnapshot
// ============================================================================

/// Read-only view of the phase clock for rendering and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Control state of the clock
    pub state: ControlState,
    /// Active (or paused) phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    /// Current round (0 before the first work phase)
    pub round: u32,
    /// Configured number of rounds
    pub rounds: u32,
    /// Seconds left in the active phase
    pub seconds_left: u32,
    /// Length of the active phase in seconds
    pub phase_duration: u32,
    /// Seconds of the session already done
    pub elapsed_seconds: u64,
    /// Length of the whole session in seconds
    pub total_seconds: u64,
}

impl ClockSnapshot {
    /// Overall session progress as a percentage in `0.0..=100.0`.
    pub fn progress_percent(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds as f64 / self.total_seconds as f64 * 100.0).min(100.0)
    }

    /// Fraction of the active phase still remaining, in `0.0..=1.0`.
    pub fn phase_remaining_ratio(&self) -> f64 {
        if self.phase_duration == 0 {
            return 0.0;
        }
        (f64::from(self.seconds_left) / f64::from(self.phase_duration)).min(1.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
