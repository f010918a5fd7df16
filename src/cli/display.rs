//! Display utilities for the Tabata timer CLI.
//!
//! This module provides formatted output for:
//! - One-shot command results (total time, presets)
//! - Error messages
//! - The live session view, rendered from clock events

use std::io::Write;

use tracing::debug;

use crate::presets::Preset;
use crate::session::{SessionObserver, SessionOutcome};
use crate::timer::ClockEvent;
use crate::types::{ClockSnapshot, Phase, SessionConfig};

/// Sessions with more rounds than this get no round dots.
const MAX_ROUND_DOTS: u32 = 20;

/// Cells in the per-phase countdown bar.
const PHASE_BAR_WIDTH: usize = 20;

// ============================================================================
// Formatting
// ============================================================================

/// Formats seconds as `m:ss` from one minute up, plain seconds below.
pub fn format_time(seconds: u64) -> String {
    if seconds >= 60 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        seconds.to_string()
    }
}

/// Second line of the session view.
pub fn round_line(phase: Phase, round: u32, rounds: u32) -> String {
    match phase {
        Phase::Prepare => "Get ready!".to_string(),
        Phase::Work | Phase::Rest => format!("Round {} of {}", round, rounds),
    }
}

/// One dot per round: `●` done, `◉` current, `○` ahead.
///
/// Empty when there are too many rounds to show.
pub fn round_dots(current: u32, rounds: u32, phase: Option<Phase>) -> String {
    if rounds > MAX_ROUND_DOTS {
        return String::new();
    }
    (1..=rounds)
        .map(|i| match phase {
            None => '●',
            Some(_) if i < current => '●',
            Some(phase) if i == current && phase != Phase::Prepare => '◉',
            Some(_) => '○',
        })
        .collect()
}

/// Countdown bar for the current phase: `█` for time left, `░` for time
/// spent.
pub fn phase_bar(remaining_ratio: f64) -> String {
    let ratio = remaining_ratio.clamp(0.0, 1.0);
    let filled = (ratio * PHASE_BAR_WIDTH as f64).round() as usize;
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(PHASE_BAR_WIDTH - filled));
    bar
}

// ============================================================================
// Display
// ============================================================================

/// Display utilities for one-shot CLI output.
pub struct Display;

impl Display {
    /// Shows the total length of a session.
    pub fn show_total(config: &SessionConfig) {
        println!("Total: {}", format_time(config.total_seconds()));
        println!(
            "  {}s work / {}s rest x {} rounds, {}s prepare",
            config.work_seconds, config.rest_seconds, config.rounds, config.prepare_seconds
        );
    }

    /// Shows the saved presets.
    pub fn show_presets(presets: &[Preset]) {
        if presets.is_empty() {
            println!("No presets saved");
            return;
        }
        let width = presets.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
        for preset in presets {
            println!("{}", Self::preset_line(preset, width));
        }
    }

    /// Shows a success message for saving a preset.
    pub fn show_preset_saved(preset: &Preset) {
        println!("* Saved preset '{}'", preset.name);
        println!("  {}", Self::preset_detail(preset));
    }

    /// Shows the result of removing a preset.
    pub fn show_preset_removed(name: &str, removed: bool) {
        if removed {
            println!("* Removed preset '{}'", name);
        } else {
            println!("No preset named '{}'", name);
        }
    }

    /// Shows the session header before the first phase.
    pub fn show_session_start(config: &SessionConfig) {
        println!(
            "> Starting: {} total. Enter (or p) pauses/resumes, s or q stops.",
            format_time(config.total_seconds())
        );
    }

    /// Shows how a session ended.
    pub fn show_outcome(outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Completed => println!("* Session complete"),
            SessionOutcome::Stopped => println!("[] Session stopped"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn preset_detail(preset: &Preset) -> String {
        format!(
            "{}s/{}s x {} (prepare {}s, {} total)",
            preset.work,
            preset.rest,
            preset.rounds,
            preset.prepare,
            format_time(preset.config().total_seconds())
        )
    }

    fn preset_line(preset: &Preset, width: usize) -> String {
        format!(
            "{:<width$}  {}",
            preset.name,
            Self::preset_detail(preset),
            width = width
        )
    }
}

// ============================================================================
// SessionDisplay
// ============================================================================

/// Renders a running session to a terminal-like writer.
///
/// Phase changes start a new block; ticks rewrite the countdown line in
/// place with a carriage return.
pub struct SessionDisplay<W: Write> {
    out: W,
    /// Whether the cursor sits on a countdown line
    mid_line: bool,
}

impl<W: Write> SessionDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, event: &ClockEvent, snapshot: &ClockSnapshot) -> std::io::Result<()> {
        match *event {
            ClockEvent::PhaseChanged { phase, round, .. } => {
                self.end_line()?;
                writeln!(
                    self.out,
                    "{}  {}  {}",
                    phase.label(),
                    round_line(phase, round, snapshot.rounds),
                    round_dots(round, snapshot.rounds, Some(phase))
                )?;
            }
            ClockEvent::Tick { seconds_left, .. } => {
                write!(
                    self.out,
                    "\r  {:>5}  {}  {:>3.0}%",
                    format_time(u64::from(seconds_left)),
                    phase_bar(snapshot.phase_remaining_ratio()),
                    snapshot.progress_percent()
                )?;
                self.mid_line = true;
            }
            ClockEvent::Paused => {
                self.end_line()?;
                writeln!(self.out, "|| PAUSED (Enter to resume)")?;
            }
            ClockEvent::Resumed { phase } => {
                self.end_line()?;
                writeln!(self.out, "> {}", phase.label())?;
            }
            ClockEvent::Stopped => {
                self.end_line()?;
            }
            ClockEvent::Completed => {
                self.end_line()?;
                writeln!(
                    self.out,
                    "COMPLETE  Great workout!  {}",
                    round_dots(snapshot.rounds, snapshot.rounds, None)
                )?;
                writeln!(self.out, "  {:>5}  100%", format_time(0))?;
            }
        }
        self.out.flush()
    }

    fn end_line(&mut self) -> std::io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }
}

impl<W: Write> SessionObserver for SessionDisplay<W> {
    fn on_event(&mut self, event: &ClockEvent, snapshot: &ClockSnapshot) {
        if let Err(e) = self.render(event, snapshot) {
            debug!("Failed to render {:?}: {}", event, e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ControlState;

    // ------------------------------------------------------------------------
    // Format Time Tests
    // ------------------------------------------------------------------------

    mod format_time_tests {
        use super::*;

        #[test]
        fn test_format_time_zero() {
            assert_eq!(format_time(0), "0");
        }

        #[test]
        fn test_format_time_seconds_only() {
            assert_eq!(format_time(59), "59");
        }

        #[test]
        fn test_format_time_one_minute() {
            assert_eq!(format_time(60), "1:00");
        }

        #[test]
        fn test_format_time_mixed() {
            assert_eq!(format_time(250), "4:10");
            assert_eq!(format_time(605), "10:05");
        }
    }

    // ------------------------------------------------------------------------
    // Label Tests
    // ------------------------------------------------------------------------

    mod label_tests {
        use super::*;

        #[test]
        fn test_round_line() {
            assert_eq!(round_line(Phase::Prepare, 0, 8), "Get ready!");
            assert_eq!(round_line(Phase::Work, 3, 8), "Round 3 of 8");
            assert_eq!(round_line(Phase::Rest, 8, 8), "Round 8 of 8");
        }

        #[test]
        fn test_round_dots() {
            assert_eq!(round_dots(0, 4, Some(Phase::Prepare)), "○○○○");
            assert_eq!(round_dots(2, 4, Some(Phase::Work)), "●◉○○");
            assert_eq!(round_dots(4, 4, None), "●●●●");
        }

        #[test]
        fn test_phase_bar() {
            assert_eq!(phase_bar(1.0), "█".repeat(20));
            assert_eq!(phase_bar(0.75), format!("{}{}", "█".repeat(15), "░".repeat(5)));
            assert_eq!(phase_bar(0.0), "░".repeat(20));
            assert_eq!(phase_bar(1.5).chars().count(), 20);
        }

        #[test]
        fn test_round_dots_hidden_for_long_sessions() {
            assert_eq!(round_dots(1, 21, Some(Phase::Work)), "");
            assert_eq!(round_dots(1, 20, Some(Phase::Work)).chars().count(), 20);
        }
    }

    // ------------------------------------------------------------------------
    // SessionDisplay Tests
    // ------------------------------------------------------------------------

    mod session_display_tests {
        use super::*;

        fn snapshot(phase: Option<Phase>, round: u32, elapsed: u64) -> ClockSnapshot {
            ClockSnapshot {
                state: ControlState::Running,
                phase,
                round,
                rounds: 8,
                seconds_left: 20,
                phase_duration: 20,
                elapsed_seconds: elapsed,
                total_seconds: 250,
            }
        }

        fn rendered(events: &[(ClockEvent, ClockSnapshot)]) -> String {
            let mut display = SessionDisplay::new(Vec::new());
            for (event, snapshot) in events {
                display.on_event(event, snapshot);
            }
            String::from_utf8(display.into_inner()).unwrap()
        }

        #[test]
        fn test_phase_change_and_tick() {
            let snap = snapshot(Some(Phase::Work), 1, 10);
            let out = rendered(&[
                (
                    ClockEvent::PhaseChanged {
                        phase: Phase::Work,
                        round: 1,
                        phase_duration: 20,
                    },
                    snap.clone(),
                ),
                (
                    ClockEvent::Tick {
                        seconds_left: 20,
                        phase_duration: 20,
                    },
                    snap,
                ),
            ]);

            assert!(out.starts_with("WORK  Round 1 of 8  ◉○○○○○○○\n"));
            assert!(out.ends_with("\r     20  ████████████████████    4%"));
        }

        #[test]
        fn test_prepare_header() {
            let out = rendered(&[(
                ClockEvent::PhaseChanged {
                    phase: Phase::Prepare,
                    round: 0,
                    phase_duration: 10,
                },
                snapshot(Some(Phase::Prepare), 0, 0),
            )]);
            assert!(out.starts_with("PREPARE  Get ready!"));
        }

        #[test]
        fn test_pause_breaks_countdown_line() {
            let mut snap = snapshot(Some(Phase::Rest), 2, 70);
            snap.seconds_left = 7;
            snap.phase_duration = 10;
            let out = rendered(&[
                (
                    ClockEvent::Tick {
                        seconds_left: 7,
                        phase_duration: 10,
                    },
                    snap.clone(),
                ),
                (ClockEvent::Paused, snap),
            ]);
            assert!(out.contains("7"));
            assert!(out.contains("██████████████░░░░░░"));
            assert!(out.ends_with("\n|| PAUSED (Enter to resume)\n"));
        }

        #[test]
        fn test_completed() {
            let mut snap = snapshot(None, 8, 250);
            snap.state = ControlState::Complete;
            let out = rendered(&[(ClockEvent::Completed, snap)]);
            assert!(out.starts_with("COMPLETE  Great workout!  ●●●●●●●●\n"));
            assert!(out.contains("100%"));
        }

        #[test]
        fn test_write_errors_are_ignored() {
            struct Broken;
            impl Write for Broken {
                fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                    Err(std::io::Error::other("closed"))
                }
                fn flush(&mut self) -> std::io::Result<()> {
                    Ok(())
                }
            }
            let mut display = SessionDisplay::new(Broken);
            display.on_event(&ClockEvent::Paused, &snapshot(None, 0, 0));
        }
    }
}
