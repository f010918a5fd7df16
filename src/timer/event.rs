//! Events emitted by the phase clock.

use tokio::sync::mpsc;

use crate::types::Phase;

// ============================================================================
// ClockEvent
// ============================================================================

/// Notifications for cue players and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// The whole-second countdown of the active phase changed
    Tick {
        /// Seconds left in the active phase
        seconds_left: u32,
        /// Length of the active phase
        phase_duration: u32,
    },
    /// A new phase became active
    PhaseChanged {
        /// The phase entered
        phase: Phase,
        /// Current round (0 during prepare)
        round: u32,
        /// Length of the phase entered
        phase_duration: u32,
    },
    /// Countdown paused
    Paused,
    /// Countdown resumed
    Resumed {
        /// The phase that continues
        phase: Phase,
    },
    /// Session abandoned, clock back to idle
    Stopped,
    /// Last rest finished
    Completed,
}

// ============================================================================
// Subscribers
// ============================================================================

/// Fan-out of clock events to every subscribed receiver.
///
/// Each subscriber gets its own unbounded channel, so a slow consumer never
/// drops or reorders events for another one.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<ClockEvent>>,
}

impl Subscribers {
    /// Registers a new subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ClockEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Sends `event` to every live subscriber, forgetting closed ones.
    pub fn emit(&mut self, event: ClockEvent) {
        self.senders.retain(|tx| tx.send(event).is_ok());
    }

    /// Number of live subscribers.
    pub fn count(&self) -> usize {
        self.senders.len()
    }
}
