//! Stake sizing implementations
//!
//! Constant stakes, or a fixed fraction of the account balance clamped to
//! configured bounds.

use rust_decimal::Decimal;

use crate::config::{RiskConfig, StakeMode};

/// Trait for stake sizing implementations
pub trait StakeSizer: Send + Sync {
    /// Stake in account currency for the given balance
    fn calculate(&self, balance: Decimal) -> Decimal;

    /// Get the sizing mode name
    fn mode_name(&self) -> &'static str;
}

/// The same stake for every trade
#[derive(Debug, Clone)]
pub struct ConstantSizer {
    pub amount: Decimal,
}

impl ConstantSizer {
    pub fn new(amount: Decimal) -> Self {
        Self { amount }
    }
}

impl StakeSizer for ConstantSizer {
    fn calculate(&self, _balance: Decimal) -> Decimal {
        self.amount
    }

    fn mode_name(&self) -> &'static str {
        "constant"
    }
}

/// Balance-proportional sizing
///
/// `clamp(balance * risk_pct, min, max)` rounded to cents. A non-positive
/// balance (not yet reported, or drained) falls back to the constant amount.
#[derive(Debug, Clone)]
pub struct DynamicSizer {
    /// Fraction of balance per trade (e.g., 0.02 = 2%)
    pub risk_pct: Decimal,
    pub min_stake: Decimal,
    pub max_stake: Decimal,
    /// Stake used when the balance is unknown or non-positive
    pub fallback: Decimal,
}

impl DynamicSizer {
    pub fn new(risk_pct: Decimal, min_stake: Decimal, max_stake: Decimal, fallback: Decimal) -> Self {
        Self {
            risk_pct,
            min_stake,
            max_stake,
            fallback,
        }
    }

    /// Create from RiskConfig
    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(
            config.risk_percentage,
            config.min_stake,
            config.max_stake,
            config.stake_amount,
        )
    }
}

impl StakeSizer for DynamicSizer {
    fn calculate(&self, balance: Decimal) -> Decimal {
        if balance <= Decimal::ZERO {
            return self.fallback;
        }

        let stake = balance * self.risk_pct;
        stake.max(self.min_stake).min(self.max_stake).round_dp(2)
    }

    fn mode_name(&self) -> &'static str {
        "dynamic"
    }
}

/// Create a stake sizer based on configuration
pub fn create_sizer(config: &RiskConfig) -> Box<dyn StakeSizer> {
    match config.stake_mode {
        StakeMode::Constant => Box::new(ConstantSizer::new(config.stake_amount)),
        StakeMode::Dynamic => Box::new(DynamicSizer::from_config(config)),
    }
}
