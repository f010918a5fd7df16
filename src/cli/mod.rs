//! CLI module for the Tabata timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and the live session view

pub mod commands;
pub mod display;

pub use commands::{Cli, Commands, ConfigArgs, PresetAction, PresetsArgs, StartArgs, TotalArgs};
pub use display::{format_time, phase_bar, round_dots, round_line, Display, SessionDisplay};
