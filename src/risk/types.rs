//! Risk management types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Login id prefix of demo (virtual) accounts
pub const DEMO_LOGIN_PREFIX: &str = "VRTC";

/// Account classification from the authorization response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Not yet authorized
    #[default]
    Unknown,
    Demo,
    Real,
}

impl AccountKind {
    /// Classify a login id
    pub fn from_login_id(login_id: &str) -> Self {
        if login_id.starts_with(DEMO_LOGIN_PREFIX) {
            AccountKind::Demo
        } else {
            AccountKind::Real
        }
    }
}

/// Reason a placement is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeBlock {
    /// Demo enforcement is on and the account is not a demo account
    #[error("Demo account required (account is {0:?})")]
    DemoAccountRequired(AccountKind),
    /// Stop-loss cool-down in effect
    #[error("Stop-loss cool-down until {until}")]
    StopLoss { until: DateTime<Utc> },
}
