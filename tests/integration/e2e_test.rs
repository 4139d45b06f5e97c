//! End-to-end integration tests

mod common;

use common::{base_config, t, tick_event, MemoryReporter, MemorySink, TOKEN};
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use digit_hft::config::{Config, LedgerConfig};
use digit_hft::engine::Session;
use digit_hft::execution::{DerivVenue, Outcome, PaperVenue};
use digit_hft::feed::VenueEvent;
use digit_hft::ledger::{LedgerReader, TradeRecorder, TradeSink};
use digit_hft::signal::StrategyKind;

#[test]
fn test_config_example_parses() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.trading.symbol, "1HZ10V");
    assert_eq!(config.consensus.weights.most_frequent, 0.4);
    assert_eq!(config.consensus.strategies.pattern_threshold, 5);
    assert_eq!(config.hedge.ratio, 49);
    assert!(config.trading.require_demo_account);
}

struct PaperRun {
    session: Session,
    paper: PaperVenue,
    events: mpsc::Receiver<VenueEvent>,
    outbound: mpsc::Receiver<String>,
}

impl PaperRun {
    async fn new(config: Config, ledger: Box<dyn TradeSink>, reporter: MemoryReporter) -> Self {
        let (out_tx, outbound) = mpsc::channel(64);
        let (event_tx, events) = mpsc::channel(1024);
        let paper = PaperVenue::new(DerivVenue::new(out_tx), config.paper.clone(), event_tx);

        let mut session = Session::new(
            config,
            TOKEN.to_string(),
            Box::new(paper.clone()),
            ledger,
            Box::new(reporter),
        );
        session.on_connected(t(0)).await;
        session
            .handle(
                VenueEvent::Authorized {
                    login_id: "VRTC5550001".to_string(),
                },
                t(0),
            )
            .await;

        Self {
            session,
            paper,
            events,
            outbound,
        }
    }

    /// Feed one tick the way the runner does, then drain paper events
    async fn tick(&mut self, digit: u8, secs: i64) {
        let event = tick_event(digit);
        if let VenueEvent::Tick(tick) = &event {
            self.paper.on_tick(tick).await;
        }
        self.session.handle(event, t(secs)).await;

        while let Ok(event) = self.events.try_recv() {
            self.session.handle(event, t(secs)).await;
        }
    }
}

#[tokio::test]
async fn test_paper_session_settles_and_credits() {
    let sink = MemorySink::default();
    let mut run = PaperRun::new(
        base_config("consensus"),
        Box::new(sink.clone()),
        MemoryReporter::default(),
    )
    .await;

    for i in 1..=20 {
        run.tick(7, i).await;
    }

    let stats = run.session.stats();
    assert!(stats.wins >= 3, "expected wins, got {}", stats.wins);
    assert_eq!(stats.losses, 0);
    assert_eq!(stats.total_profit, dec!(80) * rust_decimal::Decimal::from(stats.wins));
    assert_eq!(
        run.session
            .consensus()
            .performance(StrategyKind::Pattern)
            .win_credits,
        stats.wins
    );

    let rows = sink.rows();
    let wins = rows.iter().filter(|r| r.outcome == Outcome::Win).count() as u64;
    assert_eq!(wins, stats.wins);

    // Paper mode never sends a purchase
    let mut frames = Vec::new();
    while let Ok(frame) = run.outbound.try_recv() {
        frames.push(frame);
    }
    assert!(frames.iter().any(|f| f.contains("\"authorize\"")));
    assert!(frames.iter().any(|f| f.contains("\"ticks\"")));
    assert!(!frames.iter().any(|f| f.contains("\"buy\"")));
}

#[tokio::test]
async fn test_ledger_written_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let (recorder, handle) = TradeRecorder::spawn(LedgerConfig {
        enabled: true,
        output_dir: dir.path().to_path_buf(),
        rotation_interval_secs: 3600,
        buffer_size: 50,
        flush_interval_secs: 30,
    });

    let mut run = PaperRun::new(
        base_config("consensus"),
        Box::new(recorder),
        MemoryReporter::default(),
    )
    .await;
    for i in 1..=12 {
        run.tick(7, i).await;
    }
    let placements = run.session.stats().placements;
    let settled = run.session.stats().settled;
    assert!(settled >= 1);

    // Dropping the session closes the recorder
    drop(run);
    handle.await.unwrap();

    let files = LedgerReader::list_files(dir.path()).unwrap();
    assert_eq!(files.len(), 1);
    let rows = LedgerReader::new(&files[0]).read().unwrap();
    assert_eq!(rows.len() as u64, placements + settled);
    assert_eq!(
        rows.iter().filter(|r| r.outcome == Outcome::Pending).count() as u64,
        placements
    );
}
