//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Session-unique id attached to each buy request (`req_id` on the wire)
pub type RequestId = u64;

/// Venue-assigned contract identifier
pub type ContractId = u64;

/// Internal trade identifier
pub type TradeId = Uuid;

/// Contract type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    /// Last digit equals the barrier
    #[serde(rename = "DIGITMATCH")]
    Match,
    /// Last digit differs from the barrier
    #[serde(rename = "DIGITDIFF")]
    Differ,
    /// Exit spot above the barrier
    #[serde(rename = "CALL")]
    Call,
    /// Exit spot below the barrier
    #[serde(rename = "PUT")]
    Put,
}

impl ContractKind {
    /// Venue contract type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Match => "DIGITMATCH",
            ContractKind::Differ => "DIGITDIFF",
            ContractKind::Call => "CALL",
            ContractKind::Put => "PUT",
        }
    }

    /// Parse a venue contract type name
    pub fn from_venue(name: &str) -> Option<Self> {
        match name {
            "DIGITMATCH" => Some(ContractKind::Match),
            "DIGITDIFF" => Some(ContractKind::Differ),
            "CALL" => Some(ContractKind::Call),
            "PUT" => Some(ContractKind::Put),
            _ => None,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contract purchase to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Correlation id echoed by the venue
    pub request_id: RequestId,
    pub kind: ContractKind,
    /// Digit for digit contracts, signed offset (e.g. "+0.2") for call/put
    pub barrier: String,
    pub stake: Decimal,
    pub symbol: String,
    pub duration_ticks: u32,
    pub currency: String,
}

/// Trade outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pending,
    Win,
    Loss,
}

impl Outcome {
    /// Win when profit is strictly positive
    pub fn from_profit(profit: Decimal) -> Self {
        if profit > Decimal::ZERO {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

/// One row of the trade ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: TradeId,
    pub timestamp: DateTime<Utc>,
    /// None for settlements of contracts this session did not place
    pub kind: Option<ContractKind>,
    pub barrier: String,
    pub stake: Decimal,
    pub outcome: Outcome,
    pub profit: Decimal,
}

/// Execution errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Outbound channel is full
    #[error("Outbound queue full")]
    QueueFull,
    /// Outbound channel closed (transport gone)
    #[error("Transport closed")]
    TransportClosed,
    /// Request could not be encoded
    #[error("Encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    /// Venue refused the request
    #[error("Rejected: {0}")]
    Rejected(String),
}
