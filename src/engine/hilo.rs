//! Timed higher/lower hedge

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::config::HiLoConfig;
use crate::execution::ContractKind;

/// One leg of a higher/lower pair
#[derive(Debug, Clone, PartialEq)]
pub struct HiLoLeg {
    pub kind: ContractKind,
    pub barrier: String,
    pub stake: Decimal,
}

/// Places a CALL above and a PUT below spot every interval
pub struct HiLoSelector {
    config: HiLoConfig,
    last_cycle: Option<DateTime<Utc>>,
}

impl HiLoSelector {
    pub fn new(config: HiLoConfig) -> Self {
        Self {
            config,
            last_cycle: None,
        }
    }

    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        let interval = Duration::seconds(self.config.interval_secs as i64);
        self.last_cycle.map_or(true, |last| now - last >= interval)
    }

    /// Legs of the next cycle, starting the interval timer
    pub fn cycle(&mut self, now: DateTime<Utc>) -> [HiLoLeg; 2] {
        self.last_cycle = Some(now);
        let offset = self.config.barrier_offset.abs().normalize();
        [
            HiLoLeg {
                kind: ContractKind::Call,
                barrier: format!("+{offset}"),
                stake: self.config.stake,
            },
            HiLoLeg {
                kind: ContractKind::Put,
                barrier: format!("-{offset}"),
                stake: self.config.stake,
            },
        ]
    }

    pub fn duration_ticks(&self) -> u32 {
        self.config.duration_ticks
    }

    pub fn reset(&mut self) {
        self.last_cycle = None;
    }
}
