//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use digit_hft::config::Config;
use digit_hft::engine::Session;
use digit_hft::execution::{ContractId, ExecutionError, ExecutionVenue, TradeRecord, TradeRequest};
use digit_hft::feed::{ContractUpdate, Tick, VenueError, VenueEvent};
use digit_hft::ledger::TradeSink;
use digit_hft::report::{StatusReporter, StatusSnapshot};
use digit_hft::signal::Digit;

pub const SYMBOL: &str = "1HZ10V";
pub const TOKEN: &str = "test-token";

/// Everything a venue was asked to do
#[derive(Debug, Clone, Default)]
pub struct VenueLog {
    pub authorized: Vec<String>,
    pub tick_subscriptions: Vec<String>,
    pub balance_subscriptions: usize,
    pub submitted: Vec<TradeRequest>,
    pub failed_submissions: usize,
    pub tracked: Vec<ContractId>,
}

/// Venue that records requests and can be told to refuse submissions
#[derive(Clone, Default)]
pub struct RecordingVenue {
    log: Arc<Mutex<VenueLog>>,
    failing: Arc<AtomicBool>,
}

impl RecordingVenue {
    pub fn log(&self) -> VenueLog {
        self.log.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<TradeRequest> {
        self.log().submitted
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExecutionVenue for RecordingVenue {
    async fn authorize(&self, token: &str) -> Result<(), ExecutionError> {
        self.log.lock().unwrap().authorized.push(token.to_string());
        Ok(())
    }

    async fn subscribe_ticks(&self, symbol: &str) -> Result<(), ExecutionError> {
        self.log
            .lock()
            .unwrap()
            .tick_subscriptions
            .push(symbol.to_string());
        Ok(())
    }

    async fn subscribe_balance(&self) -> Result<(), ExecutionError> {
        self.log.lock().unwrap().balance_subscriptions += 1;
        Ok(())
    }

    async fn submit(&self, request: &TradeRequest) -> Result<(), ExecutionError> {
        let mut log = self.log.lock().unwrap();
        if self.failing.load(Ordering::SeqCst) {
            log.failed_submissions += 1;
            return Err(ExecutionError::TransportClosed);
        }
        log.submitted.push(request.clone());
        Ok(())
    }

    async fn track_contract(&self, contract_id: ContractId) -> Result<(), ExecutionError> {
        self.log.lock().unwrap().tracked.push(contract_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Ledger sink kept in memory
#[derive(Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<TradeRecord>>>,
}

impl MemorySink {
    pub fn rows(&self) -> Vec<TradeRecord> {
        self.rows.lock().unwrap().clone()
    }
}

impl TradeSink for MemorySink {
    fn append(&self, record: TradeRecord) {
        self.rows.lock().unwrap().push(record);
    }
}

/// Reporter keeping every snapshot and venue error
#[derive(Clone, Default)]
pub struct MemoryReporter {
    snapshots: Arc<Mutex<Vec<StatusSnapshot>>>,
    errors: Arc<Mutex<Vec<VenueError>>>,
}

impl MemoryReporter {
    pub fn snapshots(&self) -> Vec<StatusSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<VenueError> {
        self.errors.lock().unwrap().clone()
    }
}

impl StatusReporter for MemoryReporter {
    fn publish(&self, snapshot: &StatusSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn venue_error(&self, error: &VenueError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

/// Small windows, constant stakes and no ledger
pub fn base_config(mode: &str) -> Config {
    let toml = format!(
        r#"
        [venue]
        app_id = "1089"

        [trading]
        symbol = "{SYMBOL}"
        mode = "{mode}"
        duration_ticks = 5
        seed = 7

        [consensus]
        window_capacity = 20
        min_ticks = 5
        min_seconds_between_bursts = 0
        hold_ticks = 5
        short_hold_ticks = 3
        short_hold_after_losses = 2

        [risk]
        stake_mode = "constant"
        stake_amount = 10
        max_consecutive_losses = 3
        cooldown_secs = 300

        [ledger]
        enabled = false
    "#
    );
    Config::from_toml(&toml).unwrap()
}

pub struct Harness {
    pub session: Session,
    pub venue: RecordingVenue,
    pub sink: MemorySink,
    pub reporter: MemoryReporter,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        let venue = RecordingVenue::default();
        let sink = MemorySink::default();
        let reporter = MemoryReporter::default();
        let session = Session::new(
            config,
            TOKEN.to_string(),
            Box::new(venue.clone()),
            Box::new(sink.clone()),
            Box::new(reporter.clone()),
        );
        Self {
            session,
            venue,
            sink,
            reporter,
        }
    }

    /// Connect and authorize as a demo account
    pub async fn start(config: Config) -> Self {
        let mut harness = Self::new(config);
        harness.session.on_connected(t(0)).await;
        harness.authorize("VRTC1234567").await;
        harness
    }

    pub async fn authorize(&mut self, login_id: &str) {
        self.session
            .handle(
                VenueEvent::Authorized {
                    login_id: login_id.to_string(),
                },
                t(0),
            )
            .await;
    }

    pub async fn tick(&mut self, digit: u8, at: DateTime<Utc>) {
        self.session.handle(tick_event(digit), at).await;
    }

    /// Feed digits one second apart starting at `start` seconds
    pub async fn ticks(&mut self, digits: &[u8], start: i64) {
        for (i, digit) in digits.iter().enumerate() {
            self.tick(*digit, t(start + i as i64)).await;
        }
    }

    pub async fn ack(&mut self, req_id: Option<u64>, contract_id: ContractId) {
        self.session
            .handle(
                VenueEvent::BuyAck {
                    req_id,
                    contract_id,
                    buy_price: Decimal::TEN,
                },
                t(0),
            )
            .await;
    }

    pub async fn settle(&mut self, contract_id: ContractId, profit: Decimal, at: DateTime<Utc>) {
        self.session
            .handle(
                VenueEvent::ContractUpdate(ContractUpdate {
                    contract_id,
                    is_sold: true,
                    profit,
                    buy_price: Decimal::TEN,
                    barrier: None,
                }),
                at,
            )
            .await;
    }
}

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

/// Tick whose quote ends in `digit`
pub fn tick_event(digit: u8) -> VenueEvent {
    VenueEvent::Tick(Tick {
        symbol: SYMBOL.to_string(),
        quote: Decimal::new(65430 + digit as i64, 1),
        digit: Digit::new(digit).unwrap(),
        epoch: 1_704_067_200,
    })
}
