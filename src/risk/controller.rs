//! Per-session risk state
//!
//! Gates every placement on the account kind and the stop-loss cool-down,
//! sizes stakes, and tracks consecutive losses.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::sizing::{create_sizer, StakeSizer};
use super::types::{AccountKind, TradeBlock};
use crate::config::RiskConfig;
use crate::execution::Outcome;

/// Risk gate, stake sizing and loss streak tracking
pub struct RiskController {
    sizer: Box<dyn StakeSizer>,
    require_demo: bool,
    max_consecutive_losses: u32,
    cooldown: Duration,
    account: AccountKind,
    balance: Decimal,
    current_stake: Decimal,
    consecutive_losses: u32,
    stop_loss_until: Option<DateTime<Utc>>,
}

impl RiskController {
    pub fn new(config: &RiskConfig, require_demo: bool) -> Self {
        Self {
            sizer: create_sizer(config),
            require_demo,
            max_consecutive_losses: config.max_consecutive_losses,
            cooldown: Duration::seconds(config.cooldown_secs as i64),
            account: AccountKind::Unknown,
            balance: Decimal::ZERO,
            current_stake: config.stake_amount,
            consecutive_losses: 0,
            stop_loss_until: None,
        }
    }

    /// Check whether a placement may go ahead at `now`
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), TradeBlock> {
        if self.require_demo && self.account != AccountKind::Demo {
            return Err(TradeBlock::DemoAccountRequired(self.account));
        }
        if let Some(until) = self.stop_loss_until {
            if now < until {
                return Err(TradeBlock::StopLoss { until });
            }
        }
        Ok(())
    }

    pub fn can_trade(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_ok()
    }

    /// Size the next stake from the current balance and remember it
    pub fn calculate_stake(&mut self) -> Decimal {
        self.current_stake = self.sizer.calculate(self.balance);
        self.current_stake
    }

    /// Feed a settled outcome. Returns true when this outcome armed the stop-loss.
    pub fn record_outcome(&mut self, outcome: Outcome, now: DateTime<Utc>) -> bool {
        match outcome {
            Outcome::Win => {
                self.consecutive_losses = 0;
                false
            }
            Outcome::Loss => {
                self.consecutive_losses += 1;
                if self.consecutive_losses >= self.max_consecutive_losses {
                    let until = now + self.cooldown;
                    self.stop_loss_until = Some(until);
                    warn!(
                        consecutive_losses = self.consecutive_losses,
                        until = %until,
                        "Stop-loss triggered"
                    );
                    true
                } else {
                    false
                }
            }
            Outcome::Pending => false,
        }
    }

    /// Classify the account from the authorized login id
    pub fn set_account(&mut self, login_id: &str) {
        self.account = AccountKind::from_login_id(login_id);
        info!(login_id, account = ?self.account, "Account authorized");
    }

    pub fn update_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }

    /// Time left on the stop-loss cool-down, if any
    pub fn remaining_cooldown(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.stop_loss_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    pub fn account(&self) -> AccountKind {
        self.account
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn current_stake(&self) -> Decimal {
        self.current_stake
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn stop_loss_until(&self) -> Option<DateTime<Utc>> {
        self.stop_loss_until
    }

    pub fn sizing_mode(&self) -> &'static str {
        self.sizer.mode_name()
    }

    /// Forget all per-connection state
    pub fn reset(&mut self, fallback_stake: Decimal) {
        self.account = AccountKind::Unknown;
        self.balance = Decimal::ZERO;
        self.current_stake = fallback_stake;
        self.consecutive_losses = 0;
        self.stop_loss_until = None;
    }
}
