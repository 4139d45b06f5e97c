//! Weighted strategy consensus

use super::strategies::{self, StrategyParams};
use super::{
    Decision, Digit, DigitSet, StrategyKind, StrategyPerformance, StrategyVote, TickWindow,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Configured vote weight per strategy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct StrategyWeights {
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,
    #[serde(default = "default_most_frequent_weight")]
    pub most_frequent: f64,
    #[serde(default = "default_least_seen_weight")]
    pub least_seen: f64,
    #[serde(default = "default_breakout_weight")]
    pub breakout: f64,
}

fn default_pattern_weight() -> f64 {
    0.2
}
fn default_most_frequent_weight() -> f64 {
    0.4
}
fn default_least_seen_weight() -> f64 {
    0.3
}
fn default_breakout_weight() -> f64 {
    0.1
}

impl StrategyWeights {
    pub fn get(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::Pattern => self.pattern,
            StrategyKind::MostFrequent => self.most_frequent,
            StrategyKind::LeastSeen => self.least_seen,
            StrategyKind::Breakout => self.breakout,
        }
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            pattern: 0.2,
            most_frequent: 0.4,
            least_seen: 0.3,
            breakout: 0.1,
        }
    }
}

/// Combines strategy votes into a single digit decision
///
/// Weights are seeded from configuration and stay fixed for the run; win
/// credits are tracked next to them but never fed back into voting.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    params: StrategyParams,
    performance: [StrategyPerformance; 4],
}

impl ConsensusEngine {
    /// Create an engine with the given weights and strategy parameters
    pub fn new(weights: StrategyWeights, params: StrategyParams) -> Self {
        Self {
            params,
            performance: StrategyKind::ALL.map(|kind| StrategyPerformance::new(weights.get(kind))),
        }
    }

    /// Cast votes from every strategy, in evaluation order
    ///
    /// Each voting strategy has its proposal counter incremented.
    pub fn collect_votes(&mut self, window: &TickWindow, prior: &DigitSet) -> Vec<StrategyVote> {
        let mut votes = Vec::with_capacity(StrategyKind::ALL.len());

        for kind in StrategyKind::ALL {
            if let Some(digit) = strategies::evaluate(kind, window, prior, &self.params) {
                let perf = &mut self.performance[kind.index()];
                perf.total_proposals += 1;
                votes.push(StrategyVote {
                    strategy: kind,
                    digit,
                    weight: perf.weight,
                });
            }
        }

        votes
    }

    /// Evaluate all strategies and produce a decision, if any strategy voted
    pub fn evaluate(
        &mut self,
        window: &TickWindow,
        prior: &DigitSet,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        let votes = self.collect_votes(window, prior);
        let digit = tally(&votes)?;

        Some(Decision {
            id: Uuid::new_v4(),
            digit,
            strategies: votes.iter().map(|v| v.strategy).collect(),
            votes,
            timestamp: now,
        })
    }

    /// Credit a winning trade to the strategies that proposed it
    pub fn record_win(&mut self, strategies: &[StrategyKind]) {
        for kind in strategies {
            self.performance[kind.index()].win_credits += 1;
        }
    }

    /// Counters for one strategy
    pub fn performance(&self, kind: StrategyKind) -> &StrategyPerformance {
        &self.performance[kind.index()]
    }

    /// Counters for every strategy in evaluation order
    pub fn performances(&self) -> Vec<(StrategyKind, StrategyPerformance)> {
        StrategyKind::ALL
            .into_iter()
            .map(|kind| (kind, self.performance[kind.index()]))
            .collect()
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(StrategyWeights::default(), StrategyParams::default())
    }
}

/// Sum weights per digit and pick the heaviest
///
/// Candidates keep the order of their first vote; on equal totals the
/// earliest candidate wins.
pub fn tally(votes: &[StrategyVote]) -> Option<Digit> {
    let mut totals: Vec<(Digit, f64)> = Vec::with_capacity(votes.len());

    for vote in votes {
        match totals.iter_mut().find(|(digit, _)| *digit == vote.digit) {
            Some((_, total)) => *total += vote.weight,
            None => totals.push((vote.digit, vote.weight)),
        }
    }

    let mut best: Option<(Digit, f64)> = None;
    for (digit, total) in totals {
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((digit, total)),
        }
    }

    best.map(|(digit, _)| digit)
}
