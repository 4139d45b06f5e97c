//! Status reporting module
//!
//! Point-in-time session snapshots and the sinks that render them

mod snapshot;

pub use snapshot::{SessionStats, StatusSnapshot};

use crate::feed::VenueError;

/// Receives session snapshots and venue errors
pub trait StatusReporter: Send + Sync {
    fn publish(&self, snapshot: &StatusSnapshot);

    fn venue_error(&self, error: &VenueError) {
        let _ = error;
    }
}

/// Renders snapshots through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn publish(&self, snapshot: &StatusSnapshot) {
        tracing::info!(
            mode = %snapshot.mode,
            account = ?snapshot.account,
            balance = %snapshot.balance,
            stake = %snapshot.current_stake,
            settled = snapshot.settled,
            wins = snapshot.wins,
            win_rate = format!("{:.1}%", snapshot.win_rate * 100.0),
            total_profit = %snapshot.total_profit,
            consecutive_losses = snapshot.consecutive_losses,
            pending_coverage = snapshot.pending_coverage,
            open_contracts = snapshot.open_contracts,
            "Session status"
        );

        if let Some(secs) = snapshot.blocked_secs {
            tracing::warn!(remaining_secs = secs, "Trading paused by stop-loss");
        }

        if let Some(decision) = &snapshot.last_decision {
            let voters: Vec<&str> = decision.strategies.iter().map(|s| s.as_str()).collect();
            tracing::info!(
                digit = %decision.digit,
                strategies = ?voters,
                at = %decision.timestamp,
                "Last decision"
            );
        }

        for (kind, perf) in &snapshot.strategies {
            tracing::debug!(
                strategy = %kind,
                weight = perf.weight,
                proposals = perf.total_proposals,
                win_credits = perf.win_credits,
                "Strategy counters"
            );
        }

        for trade in &snapshot.recent {
            tracing::debug!(
                trade_id = %trade.trade_id,
                kind = ?trade.kind,
                barrier = %trade.barrier,
                stake = %trade.stake,
                outcome = trade.outcome.as_str(),
                profit = %trade.profit,
                "Recent trade"
            );
        }
    }

    fn venue_error(&self, error: &VenueError) {
        tracing::warn!(
            code = %error.code,
            msg_type = %error.msg_type,
            req_id = ?error.req_id,
            "Venue error: {}",
            error.message
        );
    }
}
