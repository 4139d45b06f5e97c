//! Trading session
//!
//! Single owner of all mutable trading state. Every venue event is handled
//! in arrival order through `&mut Session`.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::book::{ContractBook, GroupProgress, OpenTrade, Settlement};
use super::hedge::HedgeSelector;
use super::hilo::HiLoSelector;
use super::hold::HoldGate;
use super::random::RandomSelector;
use super::scheduler::CoverageScheduler;
use super::seeded_rng;
use crate::config::{Config, SelectionMode};
use crate::execution::{
    ContractKind, ExecutionVenue, Outcome, RequestId, TradeRecord, TradeRequest,
};
use crate::feed::{ContractUpdate, Tick, VenueError, VenueEvent};
use crate::ledger::TradeSink;
use crate::report::{SessionStats, StatusReporter, StatusSnapshot};
use crate::risk::{AccountKind, RiskController};
use crate::signal::{ConsensusEngine, Decision, Digit, DigitSet, StrategyKind, TickWindow};
use crate::telemetry::{
    increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};

/// One contract purchase to attempt
#[derive(Debug, Clone)]
struct Placement {
    kind: ContractKind,
    barrier: String,
    /// Fixed stake; sized by the risk controller when None
    stake: Option<Decimal>,
    strategies: Vec<StrategyKind>,
    group: Option<Uuid>,
    duration_ticks: u32,
}

impl Placement {
    fn digit_match(digit: Digit, strategies: Vec<StrategyKind>, duration_ticks: u32) -> Self {
        Self {
            kind: ContractKind::Match,
            barrier: digit.to_string(),
            stake: None,
            strategies,
            group: None,
            duration_ticks,
        }
    }
}

/// Trading session state and event handling
pub struct Session {
    config: Config,
    token: String,
    venue: Box<dyn ExecutionVenue>,
    ledger: Box<dyn TradeSink>,
    reporter: Box<dyn StatusReporter>,
    window: TickWindow,
    prior: DigitSet,
    consensus: ConsensusEngine,
    hold: HoldGate,
    coverage: CoverageScheduler,
    hedge: HedgeSelector,
    random: RandomSelector,
    hilo: HiLoSelector,
    book: ContractBook,
    risk: RiskController,
    stats: SessionStats,
    next_request_id: RequestId,
    last_decision: Option<Decision>,
    last_balance_report: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        config: Config,
        token: String,
        venue: Box<dyn ExecutionVenue>,
        ledger: Box<dyn TradeSink>,
        reporter: Box<dyn StatusReporter>,
    ) -> Self {
        let seed = config.trading.seed;
        Self {
            window: TickWindow::new(config.consensus.window_capacity),
            prior: DigitSet::empty(),
            consensus: ConsensusEngine::new(
                config.consensus.weights.clone(),
                config.consensus.strategies.clone(),
            ),
            hold: HoldGate::from_config(&config.consensus),
            coverage: CoverageScheduler::new(),
            hedge: HedgeSelector::new(config.hedge.clone(), seeded_rng(seed, 1)),
            random: RandomSelector::new(config.random.clone(), seeded_rng(seed, 2)),
            hilo: HiLoSelector::new(config.hilo.clone()),
            book: ContractBook::new(),
            risk: RiskController::new(&config.risk, config.trading.require_demo_account),
            stats: SessionStats::new(config.report.recent_trades),
            next_request_id: 1,
            last_decision: None,
            last_balance_report: None,
            config,
            token,
            venue,
            ledger,
            reporter,
        }
    }

    /// Start over on a fresh connection and authorize
    pub async fn on_connected(&mut self, now: DateTime<Utc>) {
        self.reset();
        info!(venue = self.venue.name(), at = %now, "Connected, authorizing");
        if let Err(e) = self.venue.authorize(&self.token).await {
            warn!(error = %e, "Failed to send authorization");
        }
    }

    /// Drop all per-connection state
    ///
    /// Session statistics and strategy counters survive.
    pub fn reset(&mut self) {
        self.window.clear();
        self.prior = DigitSet::empty();
        self.hold.reset();
        self.coverage.clear();
        self.book.clear();
        self.risk.reset(self.config.risk.stake_amount);
        self.hedge.reset();
        self.random.reset();
        self.hilo.reset();
        self.last_balance_report = None;
        debug!("Session state reset");
    }

    /// Handle one venue event
    pub async fn handle(&mut self, event: VenueEvent, now: DateTime<Utc>) {
        let started = Instant::now();

        match event {
            VenueEvent::Authorized { login_id } => self.on_authorized(&login_id).await,
            VenueEvent::Balance { balance } => self.on_balance(balance, now),
            VenueEvent::Tick(tick) => self.on_tick(tick, now).await,
            VenueEvent::BuyAck {
                req_id,
                contract_id,
                buy_price,
            } => self.on_buy_ack(req_id, contract_id, buy_price).await,
            VenueEvent::ContractUpdate(update) => self.on_contract_update(update, now),
            VenueEvent::Error(error) => self.on_venue_error(error, now),
            VenueEvent::Pong => trace!("Pong"),
            VenueEvent::Ignored { msg_type } => trace!(msg_type, "Ignored message"),
        }

        record_latency(LatencyMetric::EventHandling, started.elapsed());
    }

    async fn on_authorized(&mut self, login_id: &str) {
        self.risk.set_account(login_id);
        if self.config.trading.require_demo_account && self.risk.account() != AccountKind::Demo {
            warn!(login_id, "Trading blocked: demo account required");
        }

        let symbol = &self.config.trading.symbol;
        if let Err(e) = self.venue.subscribe_ticks(symbol).await {
            warn!(error = %e, symbol = %symbol, "Failed to subscribe to ticks");
        }
        if let Err(e) = self.venue.subscribe_balance().await {
            warn!(error = %e, "Failed to subscribe to balance");
        }
    }

    fn on_balance(&mut self, balance: Decimal, now: DateTime<Utc>) {
        self.risk.update_balance(balance);
        set_gauge(GaugeMetric::Balance, balance.to_f64().unwrap_or_default());

        let interval = chrono::Duration::seconds(self.config.report.interval_secs as i64);
        let due = self
            .last_balance_report
            .map_or(true, |last| now - last >= interval);
        if due {
            self.last_balance_report = Some(now);
            self.publish(now);
        }
    }

    async fn on_tick(&mut self, tick: Tick, now: DateTime<Utc>) {
        if tick.symbol != self.config.trading.symbol {
            debug!(symbol = %tick.symbol, "Tick for another symbol ignored");
            return;
        }

        self.window.append(tick.digit);
        increment(CounterMetric::Ticks);
        trace!(quote = %tick.quote, digit = %tick.digit, len = self.window.len(), "Tick");

        match self.config.trading.mode {
            SelectionMode::Consensus => self.consensus_tick(now).await,
            SelectionMode::Hedge => self.hedge_tick(now).await,
            SelectionMode::Random => self.random_tick(now).await,
            SelectionMode::HiLo => self.hilo_tick(now).await,
        }

        set_gauge(GaugeMetric::PendingCoverage, self.coverage.len() as f64);
        set_gauge(
            GaugeMetric::OpenContracts,
            (self.book.open_count() + self.book.awaiting_count()) as f64,
        );
    }

    async fn consensus_tick(&mut self, now: DateTime<Utc>) {
        let duration_ticks = self.config.trading.duration_ticks;

        // Deferred coverage placements count down even while holding
        for entry in self.coverage.advance() {
            debug!(digit = %entry.digit, decision_id = %entry.decision_id, "Coverage placement due");
            self.place(
                Placement::digit_match(entry.digit, entry.strategies, duration_ticks),
                now,
            )
            .await;
        }

        let may_evaluate = self.hold.on_tick(self.risk.consecutive_losses(), now);
        if !may_evaluate || self.window.len() < self.config.consensus.min_ticks {
            return;
        }

        let started = Instant::now();
        let decision = self.consensus.evaluate(&self.window, &self.prior, now);
        record_latency(LatencyMetric::SignalGeneration, started.elapsed());

        let Some(decision) = decision else {
            debug!("No strategy voted");
            return;
        };

        self.hold.accept(now);
        self.prior = self.window.digit_set();
        self.stats.decisions += 1;
        increment(CounterMetric::Decisions);

        let voters: Vec<&str> = decision.strategies.iter().map(|s| s.as_str()).collect();
        info!(
            decision_id = %decision.id,
            digit = %decision.digit,
            strategies = ?voters,
            "Decision accepted"
        );

        if self.config.coverage.enabled {
            for entry in self.coverage.schedule(&decision, self.config.coverage.depth) {
                self.place(
                    Placement::digit_match(entry.digit, entry.strategies, duration_ticks),
                    now,
                )
                .await;
            }
        } else {
            self.place(
                Placement::digit_match(
                    decision.digit,
                    decision.strategies.clone(),
                    duration_ticks,
                ),
                now,
            )
            .await;
        }

        self.last_decision = Some(decision);
        self.publish(now);
    }

    async fn hedge_tick(&mut self, now: DateTime<Utc>) {
        if !self.hedge.ready(&self.window, now) {
            return;
        }
        let Some(plan) = self.hedge.plan(&self.window) else {
            return;
        };

        let group = Some(Uuid::new_v4());
        let duration_ticks = self.hedge.duration_ticks();

        let differs = Placement {
            kind: ContractKind::Differ,
            barrier: plan.differs_digit.to_string(),
            stake: Some(plan.differs_stake),
            strategies: Vec::new(),
            group,
            duration_ticks,
        };
        if !self.place(differs, now).await {
            return;
        }

        let matches = Placement {
            kind: ContractKind::Match,
            barrier: plan.matches_digit.to_string(),
            stake: Some(plan.matches_stake),
            strategies: Vec::new(),
            group,
            duration_ticks,
        };
        if self.place(matches, now).await {
            self.hedge.complete(now);
            self.stats.decisions += 1;
            info!(
                differs = %plan.differs_digit,
                differs_stake = %plan.differs_stake,
                matches = %plan.matches_digit,
                matches_stake = %plan.matches_stake,
                "Hedge cycle placed"
            );
        }
    }

    async fn random_tick(&mut self, now: DateTime<Utc>) {
        if !self.random.ready(&self.window, now) {
            return;
        }

        let digits = self.random.draw(now);
        self.stats.decisions += 1;
        info!(digits = ?digits.iter().map(|d| d.value()).collect::<Vec<_>>(), "Random burst");

        let duration_ticks = self.config.trading.duration_ticks;
        for digit in digits {
            self.place(Placement::digit_match(digit, Vec::new(), duration_ticks), now)
                .await;
        }
        self.publish(now);
    }

    async fn hilo_tick(&mut self, now: DateTime<Utc>) {
        if !self.hilo.ready(now) {
            return;
        }

        let group = Some(Uuid::new_v4());
        let duration_ticks = self.hilo.duration_ticks();
        self.stats.decisions += 1;
        for leg in self.hilo.cycle(now) {
            let placement = Placement {
                kind: leg.kind,
                barrier: leg.barrier,
                stake: Some(leg.stake),
                strategies: Vec::new(),
                group,
                duration_ticks,
            };
            self.place(placement, now).await;
        }
    }

    /// Gate, size and submit one contract. Returns whether it was sent.
    async fn place(&mut self, placement: Placement, now: DateTime<Utc>) -> bool {
        if let Err(block) = self.risk.check(now) {
            debug!(reason = %block, kind = %placement.kind, "Placement blocked");
            self.stats.blocked += 1;
            increment(CounterMetric::BlockedPlacements);
            return false;
        }

        let stake = match placement.stake {
            Some(stake) => stake,
            None => self.risk.calculate_stake(),
        };
        set_gauge(GaugeMetric::CurrentStake, stake.to_f64().unwrap_or_default());

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = TradeRequest {
            request_id,
            kind: placement.kind,
            barrier: placement.barrier.clone(),
            stake,
            symbol: self.config.trading.symbol.clone(),
            duration_ticks: placement.duration_ticks,
            currency: self.config.trading.currency.clone(),
        };

        if let Err(e) = self.venue.submit(&request).await {
            warn!(error = %e, req_id = request_id, kind = %placement.kind, "Submission failed");
            increment(CounterMetric::SubmissionFailures);
            return false;
        }

        let trade = OpenTrade {
            trade_id: Uuid::new_v4(),
            request_id,
            kind: placement.kind,
            barrier: placement.barrier,
            stake,
            strategies: placement.strategies,
            group: placement.group,
            placed_at: now,
        };

        info!(
            trade_id = %trade.trade_id,
            req_id = request_id,
            kind = %trade.kind,
            barrier = %trade.barrier,
            stake = %stake,
            "Trade placed"
        );

        self.ledger.append(TradeRecord {
            trade_id: trade.trade_id,
            timestamp: now,
            kind: Some(trade.kind),
            barrier: trade.barrier.clone(),
            stake,
            outcome: Outcome::Pending,
            profit: Decimal::ZERO,
        });
        self.book.register(trade);
        self.stats.placements += 1;
        increment(CounterMetric::Placements);
        true
    }

    async fn on_buy_ack(
        &mut self,
        req_id: Option<RequestId>,
        contract_id: u64,
        buy_price: Decimal,
    ) {
        let Some(ack) = self.book.acknowledge(req_id, contract_id) else {
            warn!(?req_id, contract_id, "Buy acknowledgment for unknown request");
            return;
        };

        if ack.fifo {
            warn!(
                contract_id,
                req_id = ack.trade.request_id,
                "Buy acknowledgment without req_id, matched to oldest pending request"
            );
        }
        debug!(
            contract_id,
            trade_id = %ack.trade.trade_id,
            buy_price = %buy_price,
            "Contract bought"
        );

        if let Err(e) = self.venue.track_contract(contract_id).await {
            warn!(error = %e, contract_id, "Failed to subscribe to contract updates");
        }
    }

    fn on_contract_update(&mut self, update: ContractUpdate, now: DateTime<Utc>) {
        if !update.is_sold {
            trace!(contract_id = update.contract_id, profit = %update.profit, "Contract open");
            return;
        }

        let outcome = Outcome::from_profit(update.profit);
        let (record, risk_outcome) = match self.book.settle(update.contract_id, update.profit) {
            Settlement::Duplicate => {
                debug!(contract_id = update.contract_id, "Duplicate settlement ignored");
                return;
            }
            Settlement::Unknown => {
                warn!(contract_id = update.contract_id, "Settlement for unknown contract");
                let record = TradeRecord {
                    trade_id: Uuid::new_v4(),
                    timestamp: now,
                    kind: None,
                    barrier: update.barrier.unwrap_or_default(),
                    stake: update.buy_price,
                    outcome,
                    profit: update.profit,
                };
                (record, Some(outcome))
            }
            Settlement::Known { trade, group } => {
                if outcome == Outcome::Win && !trade.strategies.is_empty() {
                    self.consensus.record_win(&trade.strategies);
                }
                let risk_outcome = match group {
                    GroupProgress::Ungrouped => Some(outcome),
                    GroupProgress::Complete { net_profit } => {
                        Some(Outcome::from_profit(net_profit))
                    }
                    GroupProgress::Open | GroupProgress::Abandoned => None,
                };
                let record = TradeRecord {
                    trade_id: trade.trade_id,
                    timestamp: now,
                    kind: Some(trade.kind),
                    barrier: trade.barrier,
                    stake: trade.stake,
                    outcome,
                    profit: update.profit,
                };
                (record, risk_outcome)
            }
        };

        info!(
            contract_id = update.contract_id,
            trade_id = %record.trade_id,
            outcome = outcome.as_str(),
            profit = %record.profit,
            "Contract settled"
        );

        self.ledger.append(record.clone());
        self.stats.record_settlement(&record);
        increment(match outcome {
            Outcome::Win => CounterMetric::Wins,
            _ => CounterMetric::Losses,
        });

        if let Some(outcome) = risk_outcome {
            self.feed_risk(outcome, now);
        }

        set_gauge(
            GaugeMetric::TotalProfit,
            self.stats.total_profit.to_f64().unwrap_or_default(),
        );
        self.publish(now);
    }

    fn on_venue_error(&mut self, error: VenueError, now: DateTime<Utc>) {
        increment(CounterMetric::VenueErrors);
        self.reporter.venue_error(&error);

        if error.msg_type != "buy" {
            return;
        }
        let Some(req_id) = error.req_id else {
            return;
        };
        if let Some((trade, progress)) = self.book.reject(req_id) {
            warn!(
                trade_id = %trade.trade_id,
                req_id,
                code = %error.code,
                "Purchase refused by venue"
            );
            if let GroupProgress::Complete { net_profit } = progress {
                self.feed_risk(Outcome::from_profit(net_profit), now);
            }
        }
    }

    fn feed_risk(&mut self, outcome: Outcome, now: DateTime<Utc>) {
        if self.risk.record_outcome(outcome, now) {
            increment(CounterMetric::StopLossTriggers);
        }
        set_gauge(
            GaugeMetric::ConsecutiveLosses,
            self.risk.consecutive_losses() as f64,
        );
    }

    fn publish(&self, now: DateTime<Utc>) {
        self.reporter.publish(&self.snapshot(now));
    }

    /// Point-in-time view for reporting
    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            timestamp: now,
            mode: self.config.trading.mode,
            account: self.risk.account(),
            balance: self.risk.balance(),
            current_stake: self.risk.current_stake(),
            settled: self.stats.settled,
            wins: self.stats.wins,
            win_rate: self.stats.win_rate(),
            total_profit: self.stats.total_profit,
            consecutive_losses: self.risk.consecutive_losses(),
            blocked_secs: self.risk.remaining_cooldown(now).map(|d| d.num_seconds()),
            pending_coverage: self.coverage.len(),
            open_contracts: self.book.open_count() + self.book.awaiting_count(),
            recent: self.stats.recent().cloned().collect(),
            strategies: self.consensus.performances(),
            last_decision: self.last_decision.clone(),
        }
    }

    pub fn window(&self) -> &TickWindow {
        &self.window
    }

    pub fn prior_digits(&self) -> DigitSet {
        self.prior
    }

    pub fn risk(&self) -> &RiskController {
        &self.risk
    }

    pub fn book(&self) -> &ContractBook {
        &self.book
    }

    pub fn coverage(&self) -> &CoverageScheduler {
        &self.coverage
    }

    pub fn consensus(&self) -> &ConsensusEngine {
        &self.consensus
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn hold(&self) -> &HoldGate {
        &self.hold
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }
}
