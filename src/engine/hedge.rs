//! Matches/differs hedge selection
//!
//! Pairs a large DIGITDIFF leg on a digit absent from the recent ticks with a
//! small DIGITMATCH leg on the latest digit.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rust_decimal::Decimal;

use crate::config::HedgeConfig;
use crate::signal::{Digit, DigitSet, TickWindow};

/// Digits and stakes of one hedge cycle
#[derive(Debug, Clone, PartialEq)]
pub struct HedgePlan {
    pub differs_digit: Digit,
    pub differs_stake: Decimal,
    pub matches_digit: Digit,
    pub matches_stake: Decimal,
}

/// Split a total stake so that differs:matches = ratio:1, summing exactly to total
pub fn split_stakes(total: Decimal, ratio: u32) -> (Decimal, Decimal) {
    let matches = (total / (Decimal::from(ratio) + Decimal::ONE)).round_dp(2);
    (total - matches, matches)
}

/// Hedge cycle selector
pub struct HedgeSelector {
    config: HedgeConfig,
    rng: StdRng,
    last_cycle: Option<DateTime<Utc>>,
}

impl HedgeSelector {
    pub fn new(config: HedgeConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            last_cycle: None,
        }
    }

    /// Enough ticks and enough time since the last completed cycle
    pub fn ready(&self, window: &TickWindow, now: DateTime<Utc>) -> bool {
        if window.len() < self.config.min_ticks {
            return false;
        }
        let min_interval = Duration::seconds(self.config.min_interval_secs as i64);
        self.last_cycle
            .map_or(true, |last| now - last >= min_interval)
    }

    /// Pick both legs from the window
    pub fn plan(&mut self, window: &TickWindow) -> Option<HedgePlan> {
        let matches_digit = window.last()?;

        let recent: DigitSet = window.recent(self.config.recent_window).collect();
        let absent = recent.complement();
        let pool = if absent.is_empty() {
            DigitSet::full()
        } else {
            absent
        };
        let mut differs_digit = pool.iter().choose(&mut self.rng)?;

        if differs_digit == matches_digit {
            let mut others = DigitSet::full();
            others.remove(matches_digit);
            differs_digit = others.iter().choose(&mut self.rng)?;
        }

        let (differs_stake, matches_stake) =
            split_stakes(self.config.total_stake, self.config.ratio);

        Some(HedgePlan {
            differs_digit,
            differs_stake,
            matches_digit,
            matches_stake,
        })
    }

    /// Mark a cycle whose legs were both placed
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.last_cycle = Some(now);
    }

    pub fn last_cycle(&self) -> Option<DateTime<Utc>> {
        self.last_cycle
    }

    pub fn duration_ticks(&self) -> u32 {
        self.config.duration_ticks
    }

    pub fn reset(&mut self) {
        self.last_cycle = None;
    }
}
