//! Venue feed types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::execution::{ContractId, RequestId};
use crate::signal::Digit;

/// A single price tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    /// Quote as rendered on the wire
    pub quote: Decimal,
    /// Trailing digit of the quote's rendering
    pub digit: Digit,
    /// Venue epoch (seconds)
    pub epoch: i64,
}

/// Error reported by the venue for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueError {
    pub code: String,
    pub message: String,
    /// Echoed correlation id of the failed request
    pub req_id: Option<RequestId>,
    /// Request type the error answers (e.g., "buy")
    pub msg_type: String,
}

/// Contract state update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractUpdate {
    pub contract_id: ContractId,
    pub is_sold: bool,
    pub profit: Decimal,
    pub buy_price: Decimal,
    pub barrier: Option<String>,
}

/// Decoded inbound venue message
#[derive(Debug, Clone, PartialEq)]
pub enum VenueEvent {
    /// Authorization accepted
    Authorized { login_id: String },
    /// Balance update
    Balance { balance: Decimal },
    /// Price tick
    Tick(Tick),
    /// Purchase acknowledged
    BuyAck {
        req_id: Option<RequestId>,
        contract_id: ContractId,
        buy_price: Decimal,
    },
    /// Open contract update, final when `is_sold`
    ContractUpdate(ContractUpdate),
    /// Heartbeat answer
    Pong,
    /// Venue-side error for a request
    Error(VenueError),
    /// Recognized frame with nothing to act on
    Ignored { msg_type: String },
}

/// Feed decoding errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Frame is not valid JSON or does not match the message shape
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame has no `msg_type`
    #[error("Missing msg_type")]
    MissingMsgType,
    /// Required body missing for the message type
    #[error("Missing field {0}")]
    MissingField(&'static str),
    /// Quote rendering does not end in a digit
    #[error("Malformed quote: {0}")]
    MalformedQuote(String),
    /// Numeric field cannot be represented
    #[error("Invalid number in {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
}
