//! Foreground session loop.
//!
//! [`SessionRunner`] owns the phase clock, the cue player and a rendering
//! observer. It drives everything from one task: the periodic
//! re-evaluation interval, control messages from the user, and the cue
//! player's deferred word clips.

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::sound::CuePlayer;
use crate::timer::{ClockEvent, PhaseClock, REEVALUATE_INTERVAL};
use crate::types::{ClockSnapshot, ControlState, SessionConfig};

/// User input for a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    /// Pause when running, resume when paused
    Toggle,
    Stop,
}

impl Control {
    /// Parses one line of keyboard input.
    ///
    /// An empty line or `p` toggles pause, `s` or `q` stops.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "p" | "pause" => Some(Self::Toggle),
            "s" | "q" | "stop" | "quit" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every round finished
    Completed,
    /// Abandoned before the end
    Stopped,
}

/// Receives clock events for display.
///
/// `snapshot` reflects the clock after the whole batch of events was
/// emitted.
pub trait SessionObserver {
    fn on_event(&mut self, event: &ClockEvent, snapshot: &ClockSnapshot);
}

/// Runs sessions on the current task.
pub struct SessionRunner {
    clock: PhaseClock,
    cues: CuePlayer,
    display: Box<dyn SessionObserver>,
    cue_events: mpsc::UnboundedReceiver<ClockEvent>,
    display_events: mpsc::UnboundedReceiver<ClockEvent>,
}

impl SessionRunner {
    pub fn new(mut clock: PhaseClock, cues: CuePlayer, display: Box<dyn SessionObserver>) -> Self {
        let cue_events = clock.subscribe();
        let display_events = clock.subscribe();
        Self {
            clock,
            cues,
            display,
            cue_events,
            display_events,
        }
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    pub fn cues(&self) -> &CuePlayer {
        &self.cues
    }

    /// Returns a finished clock to idle so another session can run.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.dispatch();
    }

    /// Runs one session until it completes or is stopped.
    ///
    /// A completed session returns only after the cue player has played
    /// its last word clip and released the keepalive.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is out of bounds or a session is
    /// already in progress.
    pub async fn run(
        &mut self,
        config: SessionConfig,
        mut controls: mpsc::UnboundedReceiver<Control>,
    ) -> Result<SessionOutcome> {
        config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid session configuration")?;
        if self.clock.state() != ControlState::Idle {
            bail!(
                "A session is already in progress (state: {})",
                self.clock.state().as_str()
            );
        }

        self.cues.ensure_unlocked();
        self.clock.start(config);
        self.dispatch();

        let mut ticker: Option<Interval> = None;
        let mut controls_open = true;

        loop {
            match self.clock.state() {
                ControlState::Idle => return Ok(SessionOutcome::Stopped),
                ControlState::Complete if !self.cues.has_pending() => {
                    return Ok(SessionOutcome::Completed)
                }
                _ => {}
            }

            // One interval at most, alive only while the clock re-evaluates.
            if !self.clock.is_ticking() {
                ticker = None;
            } else if ticker.is_none() {
                let mut fresh = interval(REEVALUATE_INTERVAL);
                fresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker = Some(fresh);
            }
            let cue_due = self.cues.next_due().map(Instant::from_std);

            tokio::select! {
                _ = next_tick(&mut ticker) => self.clock.reevaluate(),
                control = controls.recv(), if controls_open => match control {
                    Some(control) => self.apply(control),
                    None => {
                        controls_open = false;
                        if self.clock.state() == ControlState::Paused {
                            debug!("Control input closed while paused, stopping");
                            self.clock.stop();
                        }
                    }
                },
                _ = sleep_until_due(cue_due) => {}
            }

            self.dispatch();
            self.cues.poll_deferred();
        }
    }

    fn apply(&mut self, control: Control) {
        debug!(?control, state = self.clock.state().as_str(), "control");
        match control {
            Control::Pause => self.clock.pause(),
            Control::Resume => self.clock.resume(),
            Control::Toggle => match self.clock.state() {
                ControlState::Running => self.clock.pause(),
                ControlState::Paused => self.clock.resume(),
                ControlState::Idle | ControlState::Complete => {}
            },
            Control::Stop => self.clock.stop(),
        }
    }

    /// Hands queued events to the cue player, then to the display.
    fn dispatch(&mut self) {
        while let Ok(event) = self.cue_events.try_recv() {
            self.cues.handle(&event);
        }
        let snapshot = self.clock.snapshot();
        while let Ok(event) = self.display_events.try_recv() {
            self.display.on_event(&event, &snapshot);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => sleep_until(due).await,
        None => std::future::pending().await,
    }
}
