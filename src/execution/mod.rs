//! Execution venue module
//!
//! Contract purchase and subscription requests (paper and live modes)

mod deriv;
mod paper;
mod types;

pub use deriv::DerivVenue;
pub use paper::PaperVenue;
pub use types::{
    ContractId, ContractKind, ExecutionError, Outcome, RequestId, TradeId, TradeRecord,
    TradeRequest,
};

use async_trait::async_trait;

/// Trait for execution venue implementations
///
/// Every call is fire-and-forget: `Ok` means the request was queued, not
/// that the venue accepted it. Answers arrive later as venue events.
#[async_trait]
pub trait ExecutionVenue: Send + Sync {
    /// Authorize the session with an API token
    async fn authorize(&self, token: &str) -> Result<(), ExecutionError>;
    /// Subscribe to ticks for a symbol
    async fn subscribe_ticks(&self, symbol: &str) -> Result<(), ExecutionError>;
    /// Subscribe to balance updates
    async fn subscribe_balance(&self) -> Result<(), ExecutionError>;
    /// Submit a contract purchase
    async fn submit(&self, request: &TradeRequest) -> Result<(), ExecutionError>;
    /// Subscribe to updates for a purchased contract
    async fn track_contract(&self, contract_id: ContractId) -> Result<(), ExecutionError>;
    /// Venue name for logs
    fn name(&self) -> &'static str;
}
