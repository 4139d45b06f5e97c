//! Coverage scheduler
//!
//! Spreads one decision over several consecutive ticks. Entries count down
//! once per tick and fire when they reach zero.

use uuid::Uuid;

use crate::signal::{Decision, Digit, StrategyKind};

/// A deferred placement
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrade {
    pub digit: Digit,
    pub remaining_ticks: u32,
    pub strategies: Vec<StrategyKind>,
    pub decision_id: Uuid,
}

/// Queue of deferred placements
#[derive(Debug, Default)]
pub struct CoverageScheduler {
    pending: Vec<PendingTrade>,
}

impl CoverageScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `depth` placements with delays `0..depth`
    ///
    /// Returns the entries due on the decision tick itself; the rest are queued.
    pub fn schedule(&mut self, decision: &Decision, depth: u32) -> Vec<PendingTrade> {
        let mut due = Vec::new();
        for delay in 0..depth {
            let entry = PendingTrade {
                digit: decision.digit,
                remaining_ticks: delay,
                strategies: decision.strategies.clone(),
                decision_id: decision.id,
            };
            if delay == 0 {
                due.push(entry);
            } else {
                self.pending.push(entry);
            }
        }
        due
    }

    /// Count down one tick and return the entries that fire, in queue order
    pub fn advance(&mut self) -> Vec<PendingTrade> {
        let mut due = Vec::new();
        self.pending.retain_mut(|entry| {
            entry.remaining_ticks = entry.remaining_ticks.saturating_sub(1);
            if entry.remaining_ticks == 0 {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PendingTrade] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
