//! Session statistics and snapshots

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;

use crate::config::SelectionMode;
use crate::execution::{Outcome, TradeRecord};
use crate::risk::AccountKind;
use crate::signal::{Decision, StrategyKind, StrategyPerformance};

/// Settlement statistics for the life of the process
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub settled: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_profit: Decimal,
    pub decisions: u64,
    pub placements: u64,
    pub blocked: u64,
    recent: VecDeque<TradeRecord>,
    recent_capacity: usize,
}

impl SessionStats {
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            settled: 0,
            wins: 0,
            losses: 0,
            total_profit: Decimal::ZERO,
            decisions: 0,
            placements: 0,
            blocked: 0,
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
        }
    }

    /// Count a settled trade
    pub fn record_settlement(&mut self, record: &TradeRecord) {
        self.settled += 1;
        match record.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Pending => {}
        }
        self.total_profit += record.profit;

        if self.recent_capacity == 0 {
            return;
        }
        if self.recent.len() == self.recent_capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(record.clone());
    }

    /// Wins over settled trades, 0 before the first settlement
    pub fn win_rate(&self) -> f64 {
        if self.settled == 0 {
            0.0
        } else {
            self.wins as f64 / self.settled as f64
        }
    }

    /// Most recent settlements, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &TradeRecord> {
        self.recent.iter()
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub mode: SelectionMode,
    pub account: AccountKind,
    pub balance: Decimal,
    pub current_stake: Decimal,
    pub settled: u64,
    pub wins: u64,
    pub win_rate: f64,
    pub total_profit: Decimal,
    pub consecutive_losses: u32,
    /// Seconds left on the stop-loss cool-down
    pub blocked_secs: Option<i64>,
    pub pending_coverage: usize,
    pub open_contracts: usize,
    pub recent: Vec<TradeRecord>,
    pub strategies: Vec<(StrategyKind, StrategyPerformance)>,
    pub last_decision: Option<Decision>,
}
