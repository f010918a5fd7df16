//! Session timeline arithmetic.
//!
//! A session is laid out on a single timeline measured from the moment it
//! started:
//!
//! ```text
//! 0        prepare      +work      +rest      +work ...          total
//! |--PREP--|---WORK 1---|--REST 1--|---WORK 2---| ... |--REST n--|
//! ```
//!
//! [`Schedule::locate`] maps any position on that timeline straight to its
//! slot, so catching up after a long suspension costs the same as a single
//! phase boundary.

use std::time::Duration;

use crate::types::{Phase, SessionConfig};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Where a timeline position falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Inside a phase.
    Active {
        phase: Phase,
        /// Round number; 0 during prepare.
        round: u32,
        /// Phase length in seconds.
        duration: u32,
        /// Offset of the phase end from session start, in seconds.
        end_offset: u64,
    },
    /// At or past the end of the last rest.
    Complete,
}

/// Timeline view over a [`SessionConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    config: SessionConfig,
}

impl Schedule {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    fn cycle_seconds(&self) -> u64 {
        u64::from(self.config.work_seconds) + u64::from(self.config.rest_seconds)
    }

    /// Session length in seconds.
    pub fn total_seconds(&self) -> u64 {
        self.config.total_seconds()
    }

    /// Offset from session start at which `phase` of `round` ends.
    pub fn end_offset(&self, phase: Phase, round: u32) -> u64 {
        let prepare = u64::from(self.config.prepare_seconds);
        let completed_rounds = u64::from(round.saturating_sub(1));
        match phase {
            Phase::Prepare => prepare,
            Phase::Work => {
                prepare + completed_rounds * self.cycle_seconds() + u64::from(self.config.work_seconds)
            }
            Phase::Rest => prepare + (completed_rounds + 1) * self.cycle_seconds(),
        }
    }

    /// Offset from session start at which `phase` of `round` begins.
    pub fn start_offset(&self, phase: Phase, round: u32) -> u64 {
        self.end_offset(phase, round) - u64::from(self.duration_of(phase))
    }

    /// Configured length of a phase.
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Prepare => self.config.prepare_seconds,
            Phase::Work => self.config.work_seconds,
            Phase::Rest => self.config.rest_seconds,
        }
    }

    /// Resolves the slot active at `position` past session start.
    ///
    /// A position exactly on a boundary belongs to the phase that begins
    /// there.
    pub fn locate(&self, position: Duration) -> Slot {
        let position = position.as_nanos();
        let prepare = u128::from(self.config.prepare_seconds) * NANOS_PER_SEC;
        if position < prepare {
            return self.slot(Phase::Prepare, 0);
        }

        let cycle = u128::from(self.cycle_seconds()) * NANOS_PER_SEC;
        let into_rounds = position - prepare;
        let Some(index) = into_rounds.checked_div(cycle) else {
            return Slot::Complete;
        };
        if index >= u128::from(self.config.rounds) {
            return Slot::Complete;
        }

        // index < rounds <= u32::MAX
        let round = index as u32 + 1;
        let into_cycle = into_rounds - index * cycle;
        let work = u128::from(self.config.work_seconds) * NANOS_PER_SEC;
        if into_cycle < work {
            self.slot(Phase::Work, round)
        } else {
            self.slot(Phase::Rest, round)
        }
    }

    fn slot(&self, phase: Phase, round: u32) -> Slot {
        Slot::Active {
            phase,
            round,
            duration: self.duration_of(phase),
            end_offset: self.end_offset(phase, round),
        }
    }
}
