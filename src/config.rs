//! Configuration types for digit-hft

use crate::signal::{StrategyParams, StrategyWeights};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is outside its allowed range
    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
    /// API token environment variable is unset
    #[error("Missing API token: set {0} in the environment or .env")]
    MissingToken(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub venue: VenueConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub hedge: HedgeConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub hilo: HiLoConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Venue connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Websocket endpoint without query string
    #[serde(default = "default_venue_url")]
    pub url: String,
    /// Registered application id
    pub app_id: String,
    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Application-level keep-alive interval (seconds)
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// First reconnect delay (seconds)
    #[serde(default = "default_initial_reconnect_delay_secs")]
    pub initial_reconnect_delay_secs: u64,
    /// Reconnect delay ceiling (seconds)
    #[serde(default = "default_max_reconnect_delay_secs")]
    pub max_reconnect_delay_secs: u64,
    /// Reconnect attempts before giving up (0 = unlimited)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_venue_url() -> String {
    "wss://ws.derivws.com/websockets/v3".to_string()
}
fn default_token_env() -> String {
    "API_TOKEN".to_string()
}
fn default_heartbeat_secs() -> u64 {
    30
}
fn default_initial_reconnect_delay_secs() -> u64 {
    1
}
fn default_max_reconnect_delay_secs() -> u64 {
    32
}

impl VenueConfig {
    /// Full websocket URL including the app id
    pub fn endpoint(&self) -> String {
        format!("{}?app_id={}", self.url, self.app_id)
    }

    /// Read the API token from the environment
    pub fn api_token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))
    }
}

/// Trading session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Traded symbol (e.g. "1HZ10V", Volatility 10 (1s))
    pub symbol: String,
    /// Signal selection policy
    #[serde(default)]
    pub mode: SelectionMode,
    /// Paper or live execution
    #[serde(default)]
    pub execution: ExecutionMode,
    /// Contract duration in ticks for digit trades
    #[serde(default = "default_duration_ticks")]
    pub duration_ticks: u32,
    /// Block every placement unless the account is a demo account
    #[serde(default = "default_true")]
    pub require_demo_account: bool,
    /// Account currency
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Seed for digit randomisation (hedge and random modes)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_duration_ticks() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_currency() -> String {
    "USD".to_string()
}

/// Signal selection policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Weighted strategy consensus behind the hold gate
    #[default]
    Consensus,
    /// Paired differs/matches contracts
    Hedge,
    /// Uniformly random digits
    Random,
    /// Paired higher/lower contracts around spot
    HiLo,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Consensus => "consensus",
            SelectionMode::Hedge => "hedge",
            SelectionMode::Random => "random",
            SelectionMode::HiLo => "hilo",
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consensus" => Ok(SelectionMode::Consensus),
            "hedge" => Ok(SelectionMode::Hedge),
            "random" => Ok(SelectionMode::Random),
            "hilo" => Ok(SelectionMode::HiLo),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Execution mode: paper trading or live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

/// Consensus and hold gate configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Digits retained in the tick window
    pub window_capacity: usize,
    /// Ticks required before any evaluation
    pub min_ticks: usize,
    /// Minimum seconds between accepted decisions
    pub min_seconds_between_bursts: u64,
    /// Ticks a decision is held before re-evaluating
    pub hold_ticks: u32,
    /// Hold length during a losing streak
    pub short_hold_ticks: u32,
    /// Consecutive losses above which the short hold applies
    pub short_hold_after_losses: u32,
    pub weights: StrategyWeights,
    pub strategies: StrategyParams,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            window_capacity: 100,
            min_ticks: 50,
            min_seconds_between_bursts: 10,
            hold_ticks: 5,
            short_hold_ticks: 3,
            short_hold_after_losses: 2,
            weights: StrategyWeights::default(),
            strategies: StrategyParams::default(),
        }
    }
}

/// Coverage (staggered) trading configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub enabled: bool,
    /// Trades per decision, one per consecutive tick
    pub depth: u32,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: 3,
        }
    }
}

/// Risk management configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub stake_mode: StakeMode,
    /// Constant stake, also the dynamic fallback
    pub stake_amount: Decimal,
    /// Fraction of balance staked in dynamic mode
    pub risk_percentage: Decimal,
    pub min_stake: Decimal,
    pub max_stake: Decimal,
    /// Losing streak that triggers the cool-down
    pub max_consecutive_losses: u32,
    /// Cool-down length (seconds)
    pub cooldown_secs: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stake_mode: StakeMode::Dynamic,
            stake_amount: dec!(300),
            risk_percentage: dec!(0.02),
            min_stake: dec!(10),
            max_stake: dec!(500),
            max_consecutive_losses: 5,
            cooldown_secs: 300,
        }
    }
}

/// Stake sizing mode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StakeMode {
    Constant,
    #[default]
    Dynamic,
}

/// Differs/matches hedge configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HedgeConfig {
    /// Combined stake of both legs
    pub total_stake: Decimal,
    /// Differs:matches stake ratio
    pub ratio: u32,
    /// Minimum seconds between completed cycles
    pub min_interval_secs: u64,
    /// Ticks required before the first cycle
    pub min_ticks: usize,
    /// Span searched for absent digits
    pub recent_window: usize,
    pub duration_ticks: u32,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            total_stake: dec!(3000),
            ratio: 49,
            min_interval_secs: 5,
            min_ticks: 10,
            recent_window: 10,
            duration_ticks: 5,
        }
    }
}

/// Random digit configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Distinct digits traded per burst
    pub digits_per_burst: usize,
    pub min_ticks: usize,
    pub min_interval_secs: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            digits_per_burst: 4,
            min_ticks: 50,
            min_interval_secs: 0,
        }
    }
}

/// Higher/lower hedge configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HiLoConfig {
    /// Stake per leg
    pub stake: Decimal,
    /// Distance of both barriers from spot
    pub barrier_offset: Decimal,
    pub interval_secs: u64,
    pub duration_ticks: u32,
}

impl Default for HiLoConfig {
    fn default() -> Self {
        Self {
            stake: dec!(1),
            barrier_offset: dec!(0.2),
            interval_secs: 15,
            duration_ticks: 1,
        }
    }
}

/// Paper venue payout multipliers (payout = stake * multiplier on a win)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub match_payout: Decimal,
    pub differ_payout: Decimal,
    pub call_put_payout: Decimal,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            match_payout: dec!(9.0),
            differ_payout: dec!(1.1),
            call_put_payout: dec!(1.9),
        }
    }
}

/// Trade ledger configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    pub rotation_interval_secs: u64,
    /// Rows buffered before a flush
    pub buffer_size: usize,
    pub flush_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("./ledger"),
            rotation_interval_secs: 3600,
            buffer_size: 50,
            flush_interval_secs: 30,
        }
    }
}

/// Status reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Minimum seconds between balance-driven reports
    pub interval_secs: u64,
    /// Trade records included in each snapshot
    pub recent_trades: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            recent_trades: 10,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.symbol.trim().is_empty() {
            return Err(invalid("trading.symbol", "must not be empty"));
        }
        if self.trading.duration_ticks == 0 {
            return Err(invalid("trading.duration_ticks", "must be at least 1"));
        }

        let consensus = &self.consensus;
        if consensus.window_capacity == 0 {
            return Err(invalid("consensus.window_capacity", "must be at least 1"));
        }
        if consensus.min_ticks > consensus.window_capacity {
            return Err(invalid(
                "consensus.min_ticks",
                format!(
                    "{} exceeds window capacity {}",
                    consensus.min_ticks, consensus.window_capacity
                ),
            ));
        }
        if consensus.hold_ticks == 0 || consensus.short_hold_ticks == 0 {
            return Err(invalid("consensus.hold_ticks", "must be at least 1"));
        }

        if self.coverage.enabled && self.coverage.depth == 0 {
            return Err(invalid("coverage.depth", "must be at least 1"));
        }

        let risk = &self.risk;
        if risk.min_stake > risk.max_stake {
            return Err(invalid("risk.min_stake", "exceeds risk.max_stake"));
        }
        if risk.risk_percentage.is_sign_negative() || risk.stake_amount <= Decimal::ZERO {
            return Err(invalid(
                "risk.risk_percentage",
                "percentage must be >= 0 and stake_amount > 0",
            ));
        }
        if risk.max_consecutive_losses == 0 {
            return Err(invalid("risk.max_consecutive_losses", "must be at least 1"));
        }

        if self.hedge.ratio == 0 {
            return Err(invalid("hedge.ratio", "must be at least 1"));
        }
        if self.hedge.total_stake <= Decimal::ZERO {
            return Err(invalid("hedge.total_stake", "must be positive"));
        }
        if self.random.digits_per_burst == 0 || self.random.digits_per_burst > 10 {
            return Err(invalid("random.digits_per_burst", "must be within 1..=10"));
        }

        Ok(())
    }
}
