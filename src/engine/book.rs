//! Open contract book
//!
//! Correlates placements with buy acknowledgments and settlements. Requests
//! wait under their request id until acknowledged, then live under the
//! venue contract id until sold.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use crate::execution::{ContractId, ContractKind, RequestId, TradeId};
use crate::signal::StrategyKind;

/// Settled contract ids remembered for duplicate detection
const SETTLED_HISTORY: usize = 1024;

/// A placed trade awaiting settlement
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub trade_id: TradeId,
    pub request_id: RequestId,
    pub kind: ContractKind,
    pub barrier: String,
    pub stake: Decimal,
    /// Strategies credited on a win; empty outside consensus mode
    pub strategies: Vec<StrategyKind>,
    /// Legs of one hedge cycle share a group
    pub group: Option<Uuid>,
    pub placed_at: DateTime<Utc>,
}

/// Result of correlating a buy acknowledgment
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledged {
    pub trade: OpenTrade,
    /// Matched by arrival order because the acknowledgment had no request id
    pub fifo: bool,
}

/// Group state after one of its legs resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupProgress {
    /// Trade is not part of a group
    Ungrouped,
    /// Other legs still open
    Open,
    /// Last leg resolved, with the net profit of the settled legs
    Complete { net_profit: Decimal },
    /// Every leg was refused by the venue
    Abandoned,
}

/// Result of a settlement lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Known {
        trade: OpenTrade,
        group: GroupProgress,
    },
    /// Contract was never acknowledged in this session
    Unknown,
    /// Contract already settled
    Duplicate,
}

#[derive(Debug, Clone, Default)]
struct GroupState {
    open_legs: usize,
    settled_legs: usize,
    net_profit: Decimal,
}

/// Book of trades awaiting acknowledgment or settlement
#[derive(Debug, Default)]
pub struct ContractBook {
    awaiting: VecDeque<OpenTrade>,
    contracts: HashMap<ContractId, OpenTrade>,
    /// Recent settlements, oldest first, mirrored by `settled`
    settled_order: VecDeque<ContractId>,
    settled: HashSet<ContractId>,
    groups: HashMap<Uuid, GroupState>,
}

impl ContractBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a submitted trade
    pub fn register(&mut self, trade: OpenTrade) {
        if let Some(group) = trade.group {
            self.groups.entry(group).or_default().open_legs += 1;
        }
        self.awaiting.push_back(trade);
    }

    /// Move an awaiting trade to the contract map
    ///
    /// Without a request id the oldest awaiting trade is taken.
    pub fn acknowledge(
        &mut self,
        req_id: Option<RequestId>,
        contract_id: ContractId,
    ) -> Option<Acknowledged> {
        let (trade, fifo) = match req_id {
            Some(id) => (self.take_awaiting(id)?, false),
            None => (self.awaiting.pop_front()?, true),
        };
        self.contracts.insert(contract_id, trade.clone());
        Some(Acknowledged { trade, fifo })
    }

    /// Drop an awaiting trade the venue refused
    pub fn reject(&mut self, req_id: RequestId) -> Option<(OpenTrade, GroupProgress)> {
        let trade = self.take_awaiting(req_id)?;
        let progress = self.resolve_leg(trade.group, None);
        Some((trade, progress))
    }

    /// Resolve a sold contract
    pub fn settle(&mut self, contract_id: ContractId, profit: Decimal) -> Settlement {
        if !self.remember_settled(contract_id) {
            return Settlement::Duplicate;
        }

        match self.contracts.remove(&contract_id) {
            Some(trade) => {
                let group = self.resolve_leg(trade.group, Some(profit));
                Settlement::Known { trade, group }
            }
            None => Settlement::Unknown,
        }
    }

    /// False when the contract already settled recently
    fn remember_settled(&mut self, contract_id: ContractId) -> bool {
        if !self.settled.insert(contract_id) {
            return false;
        }
        self.settled_order.push_back(contract_id);
        if self.settled_order.len() > SETTLED_HISTORY {
            if let Some(oldest) = self.settled_order.pop_front() {
                self.settled.remove(&oldest);
            }
        }
        true
    }

    fn take_awaiting(&mut self, req_id: RequestId) -> Option<OpenTrade> {
        let index = self.awaiting.iter().position(|t| t.request_id == req_id)?;
        self.awaiting.remove(index)
    }

    fn resolve_leg(&mut self, group: Option<Uuid>, profit: Option<Decimal>) -> GroupProgress {
        let Some(group) = group else {
            return GroupProgress::Ungrouped;
        };
        let Some(state) = self.groups.get_mut(&group) else {
            return GroupProgress::Ungrouped;
        };

        state.open_legs = state.open_legs.saturating_sub(1);
        if let Some(profit) = profit {
            state.settled_legs += 1;
            state.net_profit += profit;
        }
        if state.open_legs > 0 {
            return GroupProgress::Open;
        }

        let finished = self.groups.remove(&group).unwrap_or_default();
        if finished.settled_legs == 0 {
            GroupProgress::Abandoned
        } else {
            GroupProgress::Complete {
                net_profit: finished.net_profit,
            }
        }
    }

    /// Trades waiting for a buy acknowledgment
    pub fn awaiting_count(&self) -> usize {
        self.awaiting.len()
    }

    /// Acknowledged trades waiting for settlement
    pub fn open_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn clear(&mut self) {
        self.awaiting.clear();
        self.contracts.clear();
        self.settled_order.clear();
        self.settled.clear();
        self.groups.clear();
    }
}
