//! Post-decision hold gate
//!
//! After a decision is accepted the gate suppresses evaluation for a number
//! of ticks, and separately enforces a minimum wall-clock gap between
//! accepted decisions.

use chrono::{DateTime, Duration, Utc};

use crate::config::ConsensusConfig;

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Idle,
    /// Ticks seen since the last accepted decision
    Holding { ticks: u32 },
}

/// Debounce gate in front of the consensus engine
#[derive(Debug, Clone)]
pub struct HoldGate {
    state: HoldState,
    hold_ticks: u32,
    short_hold_ticks: u32,
    short_hold_after_losses: u32,
    min_interval: Duration,
    last_decision: Option<DateTime<Utc>>,
}

impl HoldGate {
    pub fn new(
        hold_ticks: u32,
        short_hold_ticks: u32,
        short_hold_after_losses: u32,
        min_interval: Duration,
    ) -> Self {
        Self {
            state: HoldState::Idle,
            hold_ticks,
            short_hold_ticks,
            short_hold_after_losses,
            min_interval,
            last_decision: None,
        }
    }

    pub fn from_config(config: &ConsensusConfig) -> Self {
        Self::new(
            config.hold_ticks,
            config.short_hold_ticks,
            config.short_hold_after_losses,
            Duration::seconds(config.min_seconds_between_bursts as i64),
        )
    }

    /// Hold length for the current loss streak
    pub fn hold_limit(&self, consecutive_losses: u32) -> u32 {
        if consecutive_losses > self.short_hold_after_losses {
            self.short_hold_ticks
        } else {
            self.hold_ticks
        }
    }

    /// Count one tick. Returns whether this tick may evaluate.
    pub fn on_tick(&mut self, consecutive_losses: u32, now: DateTime<Utc>) -> bool {
        if let HoldState::Holding { ticks } = self.state {
            let ticks = ticks + 1;
            self.state = if ticks >= self.hold_limit(consecutive_losses) {
                HoldState::Idle
            } else {
                HoldState::Holding { ticks }
            };
        }

        self.state == HoldState::Idle && self.interval_elapsed(now)
    }

    /// Enter the hold after an accepted decision
    pub fn accept(&mut self, now: DateTime<Utc>) {
        self.state = HoldState::Holding { ticks: 0 };
        self.last_decision = Some(now);
    }

    fn interval_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.last_decision
            .map_or(true, |last| now - last >= self.min_interval)
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn last_decision(&self) -> Option<DateTime<Utc>> {
        self.last_decision
    }

    pub fn reset(&mut self) {
        self.state = HoldState::Idle;
        self.last_decision = None;
    }
}
