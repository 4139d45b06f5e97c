//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Time spent handling one venue event
    EventHandling,
    /// Time spent in one consensus evaluation
    SignalGeneration,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks appended to the window
    Ticks,
    /// Frames or quotes dropped as malformed
    MalformedEvents,
    /// Decisions accepted by the hold gate
    Decisions,
    /// Trades submitted to the venue
    Placements,
    /// Placements dropped by the risk gate
    BlockedPlacements,
    /// Submissions the venue adapter could not send
    SubmissionFailures,
    /// Settled winning contracts
    Wins,
    /// Settled losing contracts
    Losses,
    /// Stop-loss cool-downs started
    StopLossTriggers,
    /// Error events reported by the venue
    VenueErrors,
    /// Transport reconnects
    Reconnects,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Account balance
    Balance,
    /// Stake used by the latest placement
    CurrentStake,
    /// Realized P&L for the session
    TotalProfit,
    /// Current losing streak
    ConsecutiveLosses,
    /// Coverage trades waiting to fire
    PendingCoverage,
    /// Contracts awaiting settlement
    OpenContracts,
}

fn latency_name(metric: LatencyMetric) -> &'static str {
    match metric {
        LatencyMetric::EventHandling => "digithft_event_handling_latency_ms",
        LatencyMetric::SignalGeneration => "digithft_signal_generation_latency_ms",
    }
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::Ticks => "digithft_ticks_total",
        CounterMetric::MalformedEvents => "digithft_malformed_events_total",
        CounterMetric::Decisions => "digithft_decisions_total",
        CounterMetric::Placements => "digithft_placements_total",
        CounterMetric::BlockedPlacements => "digithft_blocked_placements_total",
        CounterMetric::SubmissionFailures => "digithft_submission_failures_total",
        CounterMetric::Wins => "digithft_wins_total",
        CounterMetric::Losses => "digithft_losses_total",
        CounterMetric::StopLossTriggers => "digithft_stop_loss_triggers_total",
        CounterMetric::VenueErrors => "digithft_venue_errors_total",
        CounterMetric::Reconnects => "digithft_reconnects_total",
    }
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::Balance => "digithft_balance_usd",
        GaugeMetric::CurrentStake => "digithft_current_stake_usd",
        GaugeMetric::TotalProfit => "digithft_total_profit_usd",
        GaugeMetric::ConsecutiveLosses => "digithft_consecutive_losses",
        GaugeMetric::PendingCoverage => "digithft_pending_coverage",
        GaugeMetric::OpenContracts => "digithft_open_contracts",
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    ::metrics::histogram!(latency_name(metric)).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(counter_name(metric)).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    ::metrics::gauge!(gauge_name(metric)).set(value);
}

/// Serve Prometheus metrics over HTTP on the given port
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
