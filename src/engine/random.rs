//! Uniform random digit selection

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::RandomConfig;
use crate::signal::{Digit, TickWindow};

/// Picks distinct random digits for each burst
pub struct RandomSelector {
    config: RandomConfig,
    rng: StdRng,
    last_burst: Option<DateTime<Utc>>,
}

impl RandomSelector {
    pub fn new(config: RandomConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            last_burst: None,
        }
    }

    pub fn ready(&self, window: &TickWindow, now: DateTime<Utc>) -> bool {
        if window.len() < self.config.min_ticks {
            return false;
        }
        let min_interval = Duration::seconds(self.config.min_interval_secs as i64);
        self.last_burst
            .map_or(true, |last| now - last >= min_interval)
    }

    /// Draw `digits_per_burst` distinct digits and start a burst
    pub fn draw(&mut self, now: DateTime<Utc>) -> Vec<Digit> {
        self.last_burst = Some(now);
        Digit::ALL
            .choose_multiple(&mut self.rng, self.config.digits_per_burst.min(Digit::ALL.len()))
            .copied()
            .collect()
    }

    pub fn reset(&mut self) {
        self.last_burst = None;
    }
}
