//! Phase clock for the Tabata timer.
//!
//! This module provides the session state machine:
//! - Phase transitions (Prepare → Work → Rest → ... → Complete)
//! - Remaining time derived from absolute deadlines, never from tick counts
//! - Pause/resume by banking the remaining time
//! - Catch-up after the host delays or suspends re-evaluation
//!
//! The clock does no scheduling of its own. Whoever owns it calls
//! [`PhaseClock::reevaluate`] periodically while [`PhaseClock::is_ticking`]
//! is true; the period only affects how soon a change is noticed.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{ClockSnapshot, ControlState, Phase, SessionConfig};

use super::event::{ClockEvent, Subscribers};
use super::schedule::{Schedule, Slot};
use super::time_source::TimeSource;

/// Period at which the owner should call [`PhaseClock::reevaluate`].
pub const REEVALUATE_INTERVAL: Duration = Duration::from_millis(200);

/// Where the remaining time of the active phase lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Countdown {
    /// Phase ends at this instant
    Deadline(Instant),
    /// Remaining time banked while paused
    Banked(Duration),
}

/// Rounds a duration up to whole seconds.
fn ceil_secs(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

// ============================================================================
// PhaseClock
// ============================================================================

/// Deadline-driven interval timer state machine.
pub struct PhaseClock {
    /// Source of "now"
    time: Arc<dyn TimeSource>,
    /// Configuration of the current (or last) session
    config: SessionConfig,
    /// Lifecycle state
    control: ControlState,
    /// Active phase, kept while paused
    phase: Option<Phase>,
    /// 1-based round, 0 before the first work phase
    current_round: u32,
    /// Length of the active phase in seconds
    phase_duration: u32,
    /// Deadline while running, banked time while paused
    countdown: Option<Countdown>,
    /// Last second value sent as a tick
    last_emitted_second: Option<u32>,
    /// Whether periodic re-evaluation is armed
    ticking: bool,
    /// Event subscribers
    subscribers: Subscribers,
}

impl PhaseClock {
    /// Creates an idle clock reading time from `time`.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            config: SessionConfig::default(),
            control: ControlState::Idle,
            phase: None,
            current_round: 0,
            phase_duration: 0,
            countdown: None,
            last_emitted_second: None,
            ticking: false,
            subscribers: Subscribers::default(),
        }
    }

    /// Registers an event subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ClockEvent> {
        self.subscribers.subscribe()
    }

    /// Starts a new session.
    ///
    /// Ignored unless the clock is idle; a finished session must be stopped
    /// before another can start.
    pub fn start(&mut self, config: SessionConfig) {
        if self.control != ControlState::Idle {
            debug!(state = self.control.as_str(), "start ignored");
            return;
        }

        self.config = config;
        self.current_round = 0;
        self.last_emitted_second = None;
        self.control = ControlState::Running;

        let now = self.time.now();
        if config.prepare_seconds > 0 {
            let deadline = now + Duration::from_secs(u64::from(config.prepare_seconds));
            self.begin_phase(Phase::Prepare, config.prepare_seconds, deadline, now);
        } else {
            self.current_round = 1;
            let deadline = now + Duration::from_secs(u64::from(config.work_seconds));
            self.begin_phase(Phase::Work, config.work_seconds, deadline, now);
        }
        self.ticking = true;

        debug!(
            total_seconds = self.total_duration_seconds(),
            rounds = config.rounds,
            "session started"
        );
    }

    /// Pauses the countdown, banking the remaining time.
    pub fn pause(&mut self) {
        if self.control != ControlState::Running {
            debug!(state = self.control.as_str(), "pause ignored");
            return;
        }
        let Some(Countdown::Deadline(deadline)) = self.countdown else {
            return;
        };

        let remaining = deadline.saturating_duration_since(self.time.now());
        self.countdown = Some(Countdown::Banked(remaining));
        self.control = ControlState::Paused;
        self.ticking = false;

        debug!(remaining_ms = remaining.as_millis() as u64, "paused");
        self.subscribers.emit(ClockEvent::Paused);
    }

    /// Resumes a paused countdown from the banked time.
    ///
    /// A phase that was paused with nothing left is not advanced here; the
    /// next re-evaluation picks up the transition.
    pub fn resume(&mut self) {
        if self.control != ControlState::Paused {
            debug!(state = self.control.as_str(), "resume ignored");
            return;
        }
        let (Some(phase), Some(Countdown::Banked(remaining))) = (self.phase, self.countdown) else {
            return;
        };

        self.countdown = Some(Countdown::Deadline(self.time.now() + remaining));
        self.control = ControlState::Running;
        self.last_emitted_second = None;
        self.ticking = true;

        debug!(phase = phase.as_str(), "resumed");
        self.subscribers.emit(ClockEvent::Resumed { phase });
    }

    /// Abandons the session and returns to idle.
    ///
    /// Stopping an idle clock does nothing and emits nothing.
    pub fn stop(&mut self) {
        if self.control == ControlState::Idle {
            debug!("stop ignored: already idle");
            return;
        }

        self.ticking = false;
        self.control = ControlState::Idle;
        self.phase = None;
        self.current_round = 0;
        self.phase_duration = 0;
        self.countdown = None;
        self.last_emitted_second = None;

        debug!("stopped");
        self.subscribers.emit(ClockEvent::Stopped);
    }

    /// Re-reads the time and emits whatever changed since the last call.
    ///
    /// Emits at most one phase transition and one tick. When the deadline
    /// has passed the transition comes first and the tick describes the new
    /// phase, however many boundaries were crossed in between.
    pub fn reevaluate(&mut self) {
        if !self.ticking {
            return;
        }
        let Some(Countdown::Deadline(deadline)) = self.countdown else {
            return;
        };

        let now = self.time.now();
        match deadline.checked_duration_since(now) {
            Some(remaining) if !remaining.is_zero() => {
                let seconds_left = ceil_secs(remaining);
                if self.last_emitted_second != Some(seconds_left) {
                    self.last_emitted_second = Some(seconds_left);
                    self.subscribers.emit(ClockEvent::Tick {
                        seconds_left,
                        phase_duration: self.phase_duration,
                    });
                }
            }
            _ => self.advance(deadline, now),
        }
    }

    /// Moves to whatever slot is current `now`, given that the active phase
    /// ended at `deadline`.
    fn advance(&mut self, deadline: Instant, now: Instant) {
        let Some(phase) = self.phase else {
            return;
        };

        let schedule = self.schedule();
        let phase_end = schedule.end_offset(phase, self.current_round);
        let overshoot = now.saturating_duration_since(deadline);
        let position = Duration::from_secs(phase_end) + overshoot;

        match schedule.locate(position) {
            Slot::Complete => self.finish(),
            Slot::Active {
                phase: next,
                round,
                duration,
                end_offset,
            } => {
                if overshoot >= REEVALUATE_INTERVAL * 5 {
                    debug!(
                        overshoot_ms = overshoot.as_millis() as u64,
                        from = phase.as_str(),
                        to = next.as_str(),
                        round,
                        "caught up after delayed re-evaluation"
                    );
                }
                // Anchor on the old deadline so delays never accumulate.
                let next_deadline =
                    deadline + Duration::from_secs(end_offset.saturating_sub(phase_end));
                self.current_round = round;
                self.begin_phase(next, duration, next_deadline, now);
            }
        }
    }

    fn begin_phase(&mut self, phase: Phase, duration: u32, deadline: Instant, now: Instant) {
        let seconds_left = ceil_secs(deadline.saturating_duration_since(now));

        self.phase = Some(phase);
        self.phase_duration = duration;
        self.countdown = Some(Countdown::Deadline(deadline));
        self.last_emitted_second = Some(seconds_left);

        debug!(phase = phase.as_str(), round = self.current_round, duration, "phase entered");
        self.subscribers.emit(ClockEvent::PhaseChanged {
            phase,
            round: self.current_round,
            phase_duration: duration,
        });
        self.subscribers.emit(ClockEvent::Tick {
            seconds_left,
            phase_duration: duration,
        });
    }

    fn finish(&mut self) {
        self.ticking = false;
        self.control = ControlState::Complete;
        self.phase = None;
        self.countdown = None;
        self.last_emitted_second = None;

        debug!(rounds = self.config.rounds, "session complete");
        self.subscribers.emit(ClockEvent::Completed);
    }

    fn schedule(&self) -> Schedule {
        Schedule::new(self.config)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Returns the control state.
    pub fn state(&self) -> ControlState {
        self.control
    }

    /// Returns the active (or paused) phase.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Returns the current round.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Returns the length of the active phase in seconds.
    pub fn phase_duration(&self) -> u32 {
        self.phase_duration
    }

    /// Returns the configuration of the current (or last) session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns true while periodic re-evaluation is armed.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// Seconds left in the active phase.
    ///
    /// While paused this is the banked time rounded up; while running it is
    /// the last tick value sent.
    pub fn seconds_left(&self) -> u32 {
        match (self.control, self.countdown) {
            (ControlState::Paused, Some(Countdown::Banked(remaining))) => ceil_secs(remaining),
            (ControlState::Running, Some(Countdown::Deadline(deadline))) => {
                self.last_emitted_second.unwrap_or_else(|| {
                    ceil_secs(deadline.saturating_duration_since(self.time.now()))
                })
            }
            _ => 0,
        }
    }

    /// Length of the whole session in seconds.
    pub fn total_duration_seconds(&self) -> u64 {
        self.config.total_seconds()
    }

    /// Seconds of the session already done.
    pub fn elapsed_seconds(&self) -> u64 {
        match self.control {
            ControlState::Complete => self.total_duration_seconds(),
            state if state.has_phase() => {
                let Some(phase) = self.phase else {
                    return 0;
                };
                let done_in_phase = self.phase_duration.saturating_sub(self.seconds_left());
                self.schedule().start_offset(phase, self.current_round) + u64::from(done_in_phase)
            }
            _ => 0,
        }
    }

    /// Returns a read-only view for renderers.
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            state: self.control,
            phase: self.phase,
            round: self.current_round,
            rounds: self.config.rounds,
            seconds_left: self.seconds_left(),
            phase_duration: self.phase_duration,
            elapsed_seconds: self.elapsed_seconds(),
            total_seconds: self.total_duration_seconds(),
        }
    }
}

impl fmt::Debug for PhaseClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseClock")
            .field("control", &self.control)
            .field("phase", &self.phase)
            .field("current_round", &self.current_round)
            .field("phase_duration", &self.phase_duration)
            .field("ticking", &self.ticking)
            .field("subscribers", &self.subscribers.count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
