//! Run command implementation

use chrono::Utc;
use clap::Args;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{Config, ExecutionMode, SelectionMode};
use crate::engine::Session;
use crate::execution::{DerivVenue, ExecutionVenue, PaperVenue};
use crate::feed::{parse_message, spawn_heartbeat, VenueEvent};
use crate::ledger::{NullSink, TradeRecorder, TradeSink};
use crate::report::LogReporter;
use crate::telemetry::{increment, CounterMetric};
use crate::ws::{WsClient, WsConfig, WsMessage};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Settle contracts locally instead of buying them
    #[arg(long, conflicts_with = "live")]
    pub paper: bool,

    /// Send purchase requests to the venue
    #[arg(long)]
    pub live: bool,

    /// Override the selection mode (consensus, hedge, random, hilo)
    #[arg(long)]
    pub mode: Option<SelectionMode>,
}

impl RunArgs {
    /// Apply command line overrides to the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.paper {
            config.trading.execution = ExecutionMode::Paper;
        }
        if self.live {
            config.trading.execution = ExecutionMode::Live;
        }
        if let Some(mode) = self.mode {
            config.trading.mode = mode;
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config);
        let token = config.venue.api_token()?;

        tracing::info!(
            symbol = %config.trading.symbol,
            mode = %config.trading.mode,
            execution = ?config.trading.execution,
            require_demo = config.trading.require_demo_account,
            "Starting trading session"
        );

        let client = WsClient::new(WsConfig::from_venue(&config.venue));
        let (mut inbound, outbound) = client.connect();
        let heartbeat = spawn_heartbeat(
            outbound.clone(),
            Duration::from_secs(config.venue.heartbeat_secs),
        );

        let live = DerivVenue::new(outbound);
        let (paper_tx, mut paper_rx) = mpsc::channel::<VenueEvent>(1024);
        let paper = match config.trading.execution {
            ExecutionMode::Paper => Some(PaperVenue::new(live.clone(), config.paper.clone(), paper_tx)),
            ExecutionMode::Live => None,
        };
        let venue: Box<dyn ExecutionVenue> = match &paper {
            Some(paper) => Box::new(paper.clone()),
            None => Box::new(live),
        };

        let (ledger, recorder): (Box<dyn TradeSink>, Option<JoinHandle<()>>) =
            if config.ledger.enabled {
                let (recorder, handle) = TradeRecorder::spawn(config.ledger.clone());
                tracing::info!(dir = ?recorder.output_dir(), "Recording trades");
                (Box::new(recorder), Some(handle))
            } else {
                (Box::new(NullSink), None)
            };

        let mut session = Session::new(config, token, venue, ledger, Box::new(LogReporter));
        let mut connections: u64 = 0;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else {
                        tracing::warn!("Connection task ended");
                        break;
                    };
                    match message {
                        WsMessage::Connected => {
                            connections += 1;
                            if connections > 1 {
                                increment(CounterMetric::Reconnects);
                            }
                            session.on_connected(Utc::now()).await;
                        }
                        WsMessage::Text(text) => match parse_message(&text) {
                            Ok(event) => {
                                if let (Some(paper), VenueEvent::Tick(tick)) = (&paper, &event) {
                                    paper.on_tick(tick).await;
                                }
                                session.handle(event, Utc::now()).await;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Malformed venue message");
                                increment(CounterMetric::MalformedEvents);
                            }
                        },
                        WsMessage::Disconnected => tracing::warn!("Disconnected from venue"),
                        WsMessage::Reconnecting { attempt } => {
                            tracing::info!(attempt, "Reconnecting to venue");
                        }
                    }
                }
                Some(event) = paper_rx.recv() => {
                    session.handle(event, Utc::now()).await;
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
            }
        }

        heartbeat.abort();

        let summary = session.snapshot(Utc::now());
        tracing::info!(
            settled = summary.settled,
            wins = summary.wins,
            win_rate = format!("{:.1}%", summary.win_rate * 100.0),
            total_profit = %summary.total_profit,
            "Session finished"
        );

        // Dropping the session releases the last recorder handle
        drop(session);
        if let Some(recorder) = recorder {
            recorder.await?;
        }

        Ok(())
    }
}
