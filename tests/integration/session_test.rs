//! Session behavior driven through venue events

mod common;

use common::{base_config, t, Harness, SYMBOL, TOKEN};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use digit_hft::config::StakeMode;
use digit_hft::engine::HoldState;
use digit_hft::execution::{ContractKind, Outcome};
use digit_hft::feed::{ContractUpdate, VenueError, VenueEvent};
use digit_hft::risk::AccountKind;
use digit_hft::signal::{Digit, DigitSet, StrategyKind};

fn d(v: u8) -> Digit {
    Digit::new(v).unwrap()
}

#[tokio::test]
async fn test_connect_authorizes_and_subscribes() {
    let h = Harness::start(base_config("consensus")).await;
    let log = h.venue.log();
    assert_eq!(log.authorized, vec![TOKEN.to_string()]);
    assert_eq!(log.tick_subscriptions, vec![SYMBOL.to_string()]);
    assert_eq!(log.balance_subscriptions, 1);
    assert_eq!(h.session.risk().account(), AccountKind::Demo);
}

#[tokio::test]
async fn test_no_placements_without_demo_account() {
    let mut h = Harness::new(base_config("consensus"));
    h.session.on_connected(t(0)).await;
    h.authorize("CR9000001").await;

    h.ticks(&[7; 7], 1).await;

    assert!(h.venue.submitted().is_empty());
    assert_eq!(h.session.stats().decisions, 1);
    assert_eq!(h.session.stats().blocked, 3);
    assert!(h.sink.rows().is_empty());
}

#[tokio::test]
async fn test_coverage_places_on_consecutive_ticks() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.ticks(&[7; 4], 1).await;
    assert!(h.venue.submitted().is_empty());

    h.tick(7, t(5)).await;
    assert_eq!(h.venue.submitted().len(), 1);
    assert_eq!(h.session.coverage().len(), 2);

    h.tick(7, t(6)).await;
    assert_eq!(h.venue.submitted().len(), 2);

    h.tick(7, t(7)).await;
    let submitted = h.venue.submitted();
    assert_eq!(submitted.len(), 3);
    assert!(h.session.coverage().is_empty());

    for (i, request) in submitted.iter().enumerate() {
        assert_eq!(request.request_id, i as u64 + 1);
        assert_eq!(request.kind, ContractKind::Match);
        assert_eq!(request.barrier, "7");
        assert_eq!(request.stake, dec!(10));
        assert_eq!(request.duration_ticks, 5);
        assert_eq!(request.symbol, SYMBOL);
    }

    // One pending ledger row per placement
    let rows = h.sink.rows();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.outcome == Outcome::Pending));
}

#[tokio::test]
async fn test_coverage_disabled_places_once() {
    let mut config = base_config("consensus");
    config.coverage.enabled = false;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 7], 1).await;
    assert_eq!(h.venue.submitted().len(), 1);
    assert!(h.session.coverage().is_empty());
}

#[tokio::test]
async fn test_coverage_stake_follows_balance() {
    let mut config = base_config("consensus");
    config.risk.stake_mode = StakeMode::Dynamic;
    config.risk.risk_percentage = dec!(0.02);
    config.risk.min_stake = dec!(1);
    config.risk.max_stake = dec!(500);
    let mut h = Harness::start(config).await;

    h.session
        .handle(VenueEvent::Balance { balance: dec!(1000) }, t(0))
        .await;
    h.ticks(&[7; 5], 1).await;

    let queued: Vec<u32> = h
        .session
        .coverage()
        .pending()
        .iter()
        .map(|entry| entry.remaining_ticks)
        .collect();
    assert_eq!(queued, vec![1, 2]);

    h.session
        .handle(VenueEvent::Balance { balance: dec!(990) }, t(5))
        .await;
    h.tick(7, t(6)).await;
    assert_eq!(h.session.coverage().pending().len(), 1);
    assert_eq!(h.session.coverage().pending()[0].remaining_ticks, 1);

    h.session
        .handle(VenueEvent::Balance { balance: dec!(985.5) }, t(6))
        .await;
    h.tick(7, t(7)).await;

    let stakes: Vec<Decimal> = h.venue.submitted().iter().map(|r| r.stake).collect();
    assert_eq!(stakes, vec![dec!(20.00), dec!(19.80), dec!(19.71)]);
    assert_eq!(h.session.risk().current_stake(), dec!(19.71));
}

#[tokio::test]
async fn test_stop_loss_blocks_queued_coverage() {
    let mut config = base_config("consensus");
    config.risk.max_consecutive_losses = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 5], 1).await;
    assert_eq!(h.venue.submitted().len(), 1);
    assert_eq!(h.session.coverage().len(), 2);

    // First leg loses before the queued legs come due
    h.ack(Some(1), 501).await;
    h.settle(501, dec!(-10), t(5)).await;
    assert_eq!(h.session.risk().stop_loss_until(), Some(t(305)));

    h.tick(7, t(6)).await;
    h.tick(7, t(7)).await;

    assert_eq!(h.venue.submitted().len(), 1);
    assert_eq!(h.session.stats().blocked, 2);
    assert!(h.session.coverage().is_empty());
    // Only the first leg's pending row and its settlement
    assert_eq!(h.sink.rows().len(), 2);
}

#[tokio::test]
async fn test_hold_suppresses_evaluation() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.ticks(&[7; 5], 1).await;
    assert_eq!(h.session.stats().decisions, 1);
    assert_eq!(h.session.prior_digits(), DigitSet::from_iter([d(7)]));
    assert_eq!(h.session.hold().state(), HoldState::Holding { ticks: 0 });

    // Four held ticks, the fifth re-evaluates
    h.ticks(&[7; 4], 6).await;
    assert_eq!(h.session.stats().decisions, 1);
    assert_eq!(h.venue.submitted().len(), 3);

    h.tick(7, t(10)).await;
    assert_eq!(h.session.stats().decisions, 2);
    assert_eq!(h.venue.submitted().len(), 4);
}

#[tokio::test]
async fn test_min_interval_between_decisions() {
    let mut config = base_config("consensus");
    config.consensus.hold_ticks = 1;
    config.consensus.min_seconds_between_bursts = 10;
    let mut h = Harness::start(config).await;

    // Decision at t=5, next allowed from t=15
    h.ticks(&[7; 14], 1).await;
    assert_eq!(h.session.stats().decisions, 1);

    h.tick(7, t(15)).await;
    assert_eq!(h.session.stats().decisions, 2);
}

#[tokio::test]
async fn test_win_credits_every_voter() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 5], 1).await;
    let decision = h.session.last_decision().cloned().unwrap();
    assert_eq!(decision.digit, d(7));
    assert_eq!(
        decision.strategies,
        vec![
            StrategyKind::Pattern,
            StrategyKind::MostFrequent,
            StrategyKind::LeastSeen,
            StrategyKind::Breakout
        ]
    );

    h.ack(Some(1), 500).await;
    assert_eq!(h.venue.log().tracked, vec![500]);

    h.settle(500, dec!(80), t(10)).await;

    let stats = h.session.stats();
    assert_eq!(stats.settled, 1);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.total_profit, dec!(80));

    let consensus = h.session.consensus();
    for kind in StrategyKind::ALL {
        assert_eq!(consensus.performance(kind).win_credits, 1);
        assert_eq!(consensus.performance(kind).total_proposals, 1);
    }
    // Weights never move
    assert_eq!(consensus.performance(StrategyKind::MostFrequent).weight, 0.4);

    let rows = h.sink.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].trade_id, rows[1].trade_id);
    assert_eq!(rows[1].outcome, Outcome::Win);
    assert_eq!(rows[1].kind, Some(ContractKind::Match));

    let snapshot = h.reporter.snapshots().pop().unwrap();
    assert_eq!(snapshot.settled, 1);
    assert_eq!(snapshot.recent.len(), 1);
}

#[tokio::test]
async fn test_loss_does_not_credit_strategies() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 5], 1).await;
    h.ack(Some(1), 500).await;
    h.settle(500, dec!(-10), t(10)).await;

    for kind in StrategyKind::ALL {
        assert_eq!(h.session.consensus().performance(kind).win_credits, 0);
    }
    assert_eq!(h.session.risk().consecutive_losses(), 1);
}

#[tokio::test]
async fn test_duplicate_settlement_ignored() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 5], 1).await;
    h.ack(Some(1), 500).await;
    h.settle(500, dec!(-10), t(10)).await;
    h.settle(500, dec!(-10), t(11)).await;

    assert_eq!(h.session.stats().settled, 1);
    assert_eq!(h.session.risk().consecutive_losses(), 1);
    assert_eq!(h.sink.rows().len(), 2);
}

#[tokio::test]
async fn test_stop_loss_blocks_then_expires() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    config.consensus.hold_ticks = 1;
    config.consensus.short_hold_ticks = 1;
    let mut h = Harness::start(config).await;

    // Decisions on ticks 5, 6 and 7
    h.ticks(&[7; 7], 1).await;
    assert_eq!(h.venue.submitted().len(), 3);

    for (req_id, contract_id) in [(1, 501), (2, 502), (3, 503)] {
        h.ack(Some(req_id), contract_id).await;
    }
    for contract_id in [501, 502, 503] {
        h.settle(contract_id, dec!(-10), t(8)).await;
    }
    assert_eq!(h.session.risk().consecutive_losses(), 3);
    assert_eq!(h.session.risk().stop_loss_until(), Some(t(308)));

    h.tick(7, t(9)).await;
    assert_eq!(h.venue.submitted().len(), 3);
    assert_eq!(h.session.stats().blocked, 1);
    assert_eq!(h.session.snapshot(t(9)).blocked_secs, Some(299));

    h.tick(7, t(308)).await;
    assert_eq!(h.venue.submitted().len(), 4);
    assert_eq!(h.session.snapshot(t(308)).blocked_secs, None);
}

#[tokio::test]
async fn test_unknown_contract_settlement_recorded() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.session
        .handle(
            VenueEvent::ContractUpdate(ContractUpdate {
                contract_id: 999,
                is_sold: true,
                profit: dec!(-5),
                buy_price: dec!(5),
                barrier: Some("3".to_string()),
            }),
            t(1),
        )
        .await;

    let rows = h.sink.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, None);
    assert_eq!(rows[0].barrier, "3");
    assert_eq!(rows[0].stake, dec!(5));
    assert_eq!(rows[0].outcome, Outcome::Loss);
    assert_eq!(h.session.stats().losses, 1);
    assert_eq!(h.session.risk().consecutive_losses(), 1);
}

#[tokio::test]
async fn test_open_contract_update_is_not_settlement() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.session
        .handle(
            VenueEvent::ContractUpdate(ContractUpdate {
                contract_id: 42,
                is_sold: false,
                profit: dec!(3),
                buy_price: dec!(10),
                barrier: None,
            }),
            t(1),
        )
        .await;

    assert_eq!(h.session.stats().settled, 0);
    assert!(h.sink.rows().is_empty());
}

#[tokio::test]
async fn test_ack_without_req_id_matches_oldest() {
    let mut config = base_config("consensus");
    config.coverage.depth = 2;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 6], 1).await;
    assert_eq!(h.venue.submitted().len(), 2);

    h.ack(None, 600).await;
    h.ack(None, 601).await;

    assert_eq!(h.session.book().contract(600).unwrap().request_id, 1);
    assert_eq!(h.session.book().contract(601).unwrap().request_id, 2);
    assert_eq!(h.session.book().awaiting_count(), 0);
}

#[tokio::test]
async fn test_refused_purchase_leaves_book() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[7; 5], 1).await;
    assert_eq!(h.session.book().awaiting_count(), 1);

    h.session
        .handle(
            VenueEvent::Error(VenueError {
                code: "InsufficientBalance".to_string(),
                message: "Your account balance is insufficient".to_string(),
                req_id: Some(1),
                msg_type: "buy".to_string(),
            }),
            t(6),
        )
        .await;

    assert_eq!(h.session.book().awaiting_count(), 0);
    assert_eq!(h.reporter.errors().len(), 1);
    assert_eq!(h.session.risk().consecutive_losses(), 0);
}

#[tokio::test]
async fn test_reconnect_resets_connection_state() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.ticks(&[7; 5], 1).await;
    h.ack(Some(1), 700).await;
    h.settle(700, dec!(-10), t(6)).await;
    assert_eq!(h.session.coverage().len(), 2);
    assert_eq!(h.session.risk().consecutive_losses(), 1);

    h.session.on_connected(t(7)).await;

    assert!(h.session.window().is_empty());
    assert!(h.session.coverage().is_empty());
    assert!(h.session.prior_digits().is_empty());
    assert_eq!(h.session.hold().state(), HoldState::Idle);
    assert_eq!(h.session.risk().consecutive_losses(), 0);
    assert_eq!(h.session.risk().account(), AccountKind::Unknown);
    assert_eq!(h.session.book().open_count(), 0);
    // Statistics survive
    assert_eq!(h.session.stats().placements, 1);
    assert_eq!(h.session.stats().settled, 1);
    assert_eq!(h.venue.log().authorized.len(), 2);
}

#[tokio::test]
async fn test_tick_for_other_symbol_ignored() {
    let mut h = Harness::start(base_config("consensus")).await;

    h.session
        .handle(
            VenueEvent::Tick(digit_hft::feed::Tick {
                symbol: "R_100".to_string(),
                quote: dec!(1234.5),
                digit: d(5),
                epoch: 0,
            }),
            t(1),
        )
        .await;

    assert!(h.session.window().is_empty());
}

#[tokio::test]
async fn test_balance_reports_are_throttled() {
    let mut h = Harness::start(base_config("consensus")).await;

    for (balance, at) in [(dec!(1000), 1), (dec!(990), 2), (dec!(980), 11)] {
        h.session
            .handle(VenueEvent::Balance { balance }, t(at))
            .await;
    }

    assert_eq!(h.session.risk().balance(), dec!(980));
    let snapshots = h.reporter.snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].balance, dec!(1000));
    assert_eq!(snapshots[1].balance, dec!(980));
}

#[tokio::test]
async fn test_hedge_cycle_places_both_legs() {
    let mut config = base_config("hedge");
    config.hedge.min_ticks = 3;
    config.hedge.recent_window = 3;
    let mut h = Harness::start(config).await;

    h.ticks(&[1, 2, 3], 0).await;

    let submitted = h.venue.submitted();
    assert_eq!(submitted.len(), 2);

    let differs = &submitted[0];
    assert_eq!(differs.kind, ContractKind::Differ);
    assert_eq!(differs.stake, dec!(2940));
    assert!(!["1", "2", "3"].contains(&differs.barrier.as_str()));

    let matches = &submitted[1];
    assert_eq!(matches.kind, ContractKind::Match);
    assert_eq!(matches.barrier, "3");
    assert_eq!(matches.stake, dec!(60));
    assert_eq!(differs.stake + matches.stake, dec!(3000));

    // Cycle interval not yet elapsed
    h.tick(4, t(3)).await;
    assert_eq!(h.venue.submitted().len(), 2);
}

#[tokio::test]
async fn test_hedge_first_leg_failure_skips_second() {
    let mut config = base_config("hedge");
    config.hedge.min_ticks = 3;
    config.hedge.recent_window = 3;
    let mut h = Harness::start(config).await;

    h.venue.set_failing(true);
    h.ticks(&[1, 2, 3], 0).await;
    let log = h.venue.log();
    assert!(log.submitted.is_empty());
    assert_eq!(log.failed_submissions, 1);

    // Cycle timer was not started, so the next tick retries
    h.venue.set_failing(false);
    h.tick(4, t(3)).await;
    assert_eq!(h.venue.submitted().len(), 2);
}

#[tokio::test]
async fn test_hedge_group_feeds_risk_once() {
    let mut config = base_config("hedge");
    config.hedge.min_ticks = 3;
    config.hedge.recent_window = 3;
    let mut h = Harness::start(config).await;

    h.ticks(&[1, 2, 3], 0).await;
    h.ack(Some(1), 801).await;
    h.ack(Some(2), 802).await;

    // Differs leg lost, group still open
    h.settle(801, dec!(-2940), t(10)).await;
    assert_eq!(h.session.risk().consecutive_losses(), 0);
    assert_eq!(h.session.stats().losses, 1);

    // Matches leg won, but the cycle nets a loss
    h.settle(802, dec!(480), t(11)).await;
    assert_eq!(h.session.risk().consecutive_losses(), 1);
    assert_eq!(h.session.stats().wins, 1);
    assert_eq!(h.session.stats().total_profit, dec!(-2460));
}

#[tokio::test]
async fn test_random_burst_distinct_digits() {
    let mut config = base_config("random");
    config.random.min_ticks = 3;
    let mut h = Harness::start(config).await;

    h.ticks(&[5, 5, 5], 0).await;

    let submitted = h.venue.submitted();
    assert_eq!(submitted.len(), 4);
    let digits: DigitSet = submitted
        .iter()
        .map(|r| d(r.barrier.parse().unwrap()))
        .collect();
    assert_eq!(digits.len(), 4);
    assert!(submitted.iter().all(|r| r.kind == ContractKind::Match));
    assert_eq!(h.session.stats().decisions, 1);
}

#[tokio::test]
async fn test_hilo_pairs_on_interval() {
    let mut h = Harness::start(base_config("hilo")).await;

    h.tick(3, t(0)).await;
    let submitted = h.venue.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].kind, ContractKind::Call);
    assert_eq!(submitted[0].barrier, "+0.2");
    assert_eq!(submitted[1].kind, ContractKind::Put);
    assert_eq!(submitted[1].barrier, "-0.2");
    assert!(submitted.iter().all(|r| r.stake == Decimal::ONE));
    assert!(submitted.iter().all(|r| r.duration_ticks == 1));

    h.tick(4, t(5)).await;
    assert_eq!(h.venue.submitted().len(), 2);

    h.tick(5, t(15)).await;
    assert_eq!(h.venue.submitted().len(), 4);
}
