//! Risk management module
//!
//! Stake sizing, demo-account enforcement and the stop-loss cool-down

mod controller;
mod sizing;
mod types;

pub use controller::RiskController;
pub use sizing::{create_sizer, ConstantSizer, DynamicSizer, StakeSizer};
pub use types::{AccountKind, TradeBlock, DEMO_LOGIN_PREFIX};
