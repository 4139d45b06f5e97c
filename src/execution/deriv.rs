//! Live Deriv execution venue

use super::{ContractId, ExecutionError, ExecutionVenue, TradeRequest};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Writes Deriv API requests onto the websocket outbound queue
#[derive(Clone)]
pub struct DerivVenue {
    outbound: mpsc::Sender<String>,
}

impl DerivVenue {
    pub fn new(outbound: mpsc::Sender<String>) -> Self {
        Self { outbound }
    }

    fn send(&self, request: &Value) -> Result<(), ExecutionError> {
        let text = serde_json::to_string(request)?;
        self.outbound.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ExecutionError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ExecutionError::TransportClosed,
        })
    }
}

/// Buy request for a trade
pub fn buy_request(request: &TradeRequest) -> Result<Value, ExecutionError> {
    let price = money(request.stake)?;
    Ok(json!({
        "buy": 1,
        "price": price,
        "parameters": {
            "amount": price,
            "basis": "stake",
            "contract_type": request.kind.as_str(),
            "currency": request.currency,
            "duration": request.duration_ticks,
            "duration_unit": "t",
            "symbol": request.symbol,
            "barrier": request.barrier,
        },
        "req_id": request.request_id,
    }))
}

fn money(amount: Decimal) -> Result<Value, ExecutionError> {
    amount
        .round_dp(2)
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ExecutionError::Rejected(format!("unrepresentable amount {amount}")))
}

#[async_trait]
impl ExecutionVenue for DerivVenue {
    async fn authorize(&self, token: &str) -> Result<(), ExecutionError> {
        self.send(&json!({ "authorize": token }))
    }

    async fn subscribe_ticks(&self, symbol: &str) -> Result<(), ExecutionError> {
        self.send(&json!({ "ticks": symbol, "subscribe": 1 }))
    }

    async fn subscribe_balance(&self) -> Result<(), ExecutionError> {
        self.send(&json!({ "balance": 1, "subscribe": 1 }))
    }

    async fn submit(&self, request: &TradeRequest) -> Result<(), ExecutionError> {
        self.send(&buy_request(request)?)?;
        tracing::debug!(
            req_id = request.request_id,
            kind = %request.kind,
            barrier = %request.barrier,
            stake = %request.stake,
            "Buy request sent"
        );
        Ok(())
    }

    async fn track_contract(&self, contract_id: ContractId) -> Result<(), ExecutionError> {
        self.send(&json!({
            "proposal_open_contract": 1,
            "contract_id": contract_id,
            "subscribe": 1,
        }))
    }

    fn name(&self) -> &'static str {
        "deriv"
    }
}
