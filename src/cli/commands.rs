//! Command definitions for the Tabata timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::SessionConfig;

// ============================================================================
// CLI Structure
// ============================================================================

/// Tabata Timer CLI - interval workouts in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "tabata",
    version,
    about = "Tabata interval timer with audio cues",
    long_about = "A terminal interval timer: an optional prepare phase, then rounds of\n\
                  work and rest, with beeps for the last three seconds of every phase.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a session in the foreground
    Start(StartArgs),

    /// Print the total length of a session
    Total(TotalArgs),

    /// Manage saved presets
    Presets(PresetsArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Session Configuration Arguments
// ============================================================================

/// Session configuration flags shared by several commands.
///
/// Unset flags fall back to the preset (if any), then to the Classic
/// Tabata defaults.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Work duration in seconds (5-300)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(5..=300))]
    pub work: Option<u32>,

    /// Rest duration in seconds (5-300)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(5..=300))]
    pub rest: Option<u32>,

    /// Number of rounds (1-99)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=99))]
    pub rounds: Option<u32>,

    /// Prepare duration in seconds (0-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=60))]
    pub prepare: Option<u32>,

    /// Start from a saved preset
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,
}

impl ConfigArgs {
    /// Overrides the fields of `base` that were given on the command line.
    pub fn apply(&self, base: SessionConfig) -> SessionConfig {
        SessionConfig {
            work_seconds: self.work.unwrap_or(base.work_seconds),
            rest_seconds: self.rest.unwrap_or(base.rest_seconds),
            rounds: self.rounds.unwrap_or(base.rounds),
            prepare_seconds: self.prepare.unwrap_or(base.prepare_seconds),
        }
    }
}

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Presets file to read --preset from
    #[arg(long, value_name = "PATH")]
    pub presets_file: Option<PathBuf>,

    /// Disable audio cues
    #[arg(long)]
    pub no_sound: bool,

    /// Directory holding the work/rest/done word clips
    #[arg(long, value_name = "DIR")]
    pub sounds_dir: Option<PathBuf>,
}

/// Arguments for the total command
#[derive(Args, Debug, Clone, Default)]
pub struct TotalArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Presets file to read --preset from
    #[arg(long, value_name = "PATH")]
    pub presets_file: Option<PathBuf>,
}

// ============================================================================
// Presets Arguments
// ============================================================================

/// Arguments for the presets command
#[derive(Args, Debug, Clone)]
pub struct PresetsArgs {
    #[command(subcommand)]
    pub action: PresetAction,

    /// Presets file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub presets_file: Option<PathBuf>,
}

/// Preset subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PresetAction {
    /// List saved presets
    List,

    /// Save a preset (replaces one with the same name)
    Save {
        /// Preset name
        #[arg(value_parser = validate_preset_name)]
        name: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Remove a preset
    Remove {
        /// Preset name
        name: String,
    },
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a preset name.
///
/// - Must not be blank
/// - Must not exceed 50 characters
fn validate_preset_name(s: &str) -> Result<String, String> {
    let name = s.trim();
    if name.is_empty() {
        return Err("Preset name must not be empty".to_string());
    }
    if name.chars().count() > 50 {
        return Err("Preset name must be at most 50 characters".to_string());
    }
    Ok(name.to_string())
}

// ============================================================================
// Tests
// ============================================================================
