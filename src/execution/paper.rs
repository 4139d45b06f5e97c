//! Paper trading execution venue

use super::{ContractId, ContractKind, DerivVenue, ExecutionError, ExecutionVenue, TradeRequest};
use crate::config::PaperConfig;
use crate::feed::{ContractUpdate, Tick, VenueEvent};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Contract id space for simulated contracts
const FIRST_PAPER_CONTRACT: ContractId = 1_000_000;

#[derive(Debug, Clone)]
struct PaperContract {
    contract_id: ContractId,
    request: TradeRequest,
    /// Quote of the first tick after purchase
    entry_quote: Option<Decimal>,
    /// Ticks seen after the entry tick
    elapsed: u32,
}

#[derive(Debug)]
struct PaperState {
    next_contract_id: ContractId,
    open: Vec<PaperContract>,
}

/// Paper trading venue with simulated settlement
///
/// Subscriptions and authorization go to the live socket so that ticks and
/// the account kind are real. Purchases never leave the process: they are
/// acknowledged immediately and settled against the following ticks.
#[derive(Clone)]
pub struct PaperVenue {
    live: DerivVenue,
    payouts: PaperConfig,
    events: mpsc::Sender<VenueEvent>,
    state: Arc<RwLock<PaperState>>,
}

impl PaperVenue {
    /// Create a new paper venue. Synthetic events are sent on `events`.
    pub fn new(live: DerivVenue, payouts: PaperConfig, events: mpsc::Sender<VenueEvent>) -> Self {
        Self {
            live,
            payouts,
            events,
            state: Arc::new(RwLock::new(PaperState {
                next_contract_id: FIRST_PAPER_CONTRACT,
                open: Vec::new(),
            })),
        }
    }

    /// Advance open contracts with a new tick, settling those that expire
    pub async fn on_tick(&self, tick: &Tick) {
        let mut state = self.state.write().await;
        let mut settled = Vec::new();

        state.open.retain_mut(|contract| {
            let Some(entry) = contract.entry_quote else {
                contract.entry_quote = Some(tick.quote);
                return true;
            };
            contract.elapsed += 1;
            if contract.elapsed < contract.request.duration_ticks {
                return true;
            }
            settled.push(self.settle(contract, entry, tick));
            false
        });
        drop(state);

        for update in settled {
            tracing::info!(
                contract_id = update.contract_id,
                profit = %update.profit,
                "Paper contract settled"
            );
            self.emit(VenueEvent::ContractUpdate(update));
        }
    }

    /// Number of unsettled contracts
    pub async fn open_contracts(&self) -> usize {
        self.state.read().await.open.len()
    }

    fn settle(&self, contract: &PaperContract, entry: Decimal, exit: &Tick) -> ContractUpdate {
        let request = &contract.request;
        let (won, multiplier) = match request.kind {
            ContractKind::Match => (
                request.barrier == exit.digit.to_string(),
                self.payouts.match_payout,
            ),
            ContractKind::Differ => (
                request.barrier != exit.digit.to_string(),
                self.payouts.differ_payout,
            ),
            ContractKind::Call => (
                exit.quote > entry + barrier_offset(&request.barrier),
                self.payouts.call_put_payout,
            ),
            ContractKind::Put => (
                exit.quote < entry + barrier_offset(&request.barrier),
                self.payouts.call_put_payout,
            ),
        };

        let profit = if won {
            (request.stake * multiplier - request.stake).round_dp(2)
        } else {
            -request.stake
        };

        ContractUpdate {
            contract_id: contract.contract_id,
            is_sold: true,
            profit,
            buy_price: request.stake,
            barrier: Some(request.barrier.clone()),
        }
    }

    fn emit(&self, event: VenueEvent) {
        if let Err(e) = self.events.try_send(event) {
            tracing::warn!(error = %e, "Paper event dropped");
        }
    }
}

/// Signed barrier offset such as "+0.2" or "-0.2"
fn barrier_offset(barrier: &str) -> Decimal {
    Decimal::from_str(barrier.trim_start_matches('+')).unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl ExecutionVenue for PaperVenue {
    async fn authorize(&self, token: &str) -> Result<(), ExecutionError> {
        self.live.authorize(token).await
    }

    async fn subscribe_ticks(&self, symbol: &str) -> Result<(), ExecutionError> {
        self.live.subscribe_ticks(symbol).await
    }

    async fn subscribe_balance(&self) -> Result<(), ExecutionError> {
        self.live.subscribe_balance().await
    }

    async fn submit(&self, request: &TradeRequest) -> Result<(), ExecutionError> {
        let contract_id = {
            let mut state = self.state.write().await;
            let contract_id = state.next_contract_id;
            state.next_contract_id += 1;
            state.open.push(PaperContract {
                contract_id,
                request: request.clone(),
                entry_quote: None,
                elapsed: 0,
            });
            contract_id
        };

        tracing::info!(
            contract_id,
            kind = %request.kind,
            barrier = %request.barrier,
            stake = %request.stake,
            "Paper contract bought"
        );
        self.emit(VenueEvent::BuyAck {
            req_id: Some(request.request_id),
            contract_id,
            buy_price: request.stake,
        });
        Ok(())
    }

    async fn track_contract(&self, _contract_id: ContractId) -> Result<(), ExecutionError> {
        // Paper contracts are always tracked
        Ok(())
    }

    fn name(&self) -> &'static str {
        "paper"
    }
}
