//! Venue frames decoded and fed into a session

mod common;

use common::{base_config, t, Harness};
use rust_decimal_macros::dec;

use digit_hft::execution::{ContractKind, Outcome};
use digit_hft::feed::{parse_message, VenueEvent};
use digit_hft::risk::AccountKind;

async fn feed(h: &mut Harness, frame: &str, secs: i64) {
    let event = parse_message(frame).unwrap();
    h.session.handle(event, t(secs)).await;
}

fn tick_frame(quote: &str, epoch: i64) -> String {
    format!(
        r#"{{"echo_req":{{"ticks":"1HZ10V","subscribe":1}},"msg_type":"tick",
            "subscription":{{"id":"f1c2"}},
            "tick":{{"ask":{quote},"bid":{quote},"epoch":{epoch},"id":"f1c2",
                     "pip_size":2,"quote":{quote},"symbol":"1HZ10V"}}}}"#
    )
}

#[tokio::test]
async fn test_frames_drive_a_full_trade() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::new(config);
    h.session.on_connected(t(0)).await;

    feed(
        &mut h,
        r#"{"echo_req":{"authorize":"<not shown>"},"msg_type":"authorize",
            "authorize":{"balance":10000,"currency":"USD","is_virtual":1,
                         "loginid":"VRTC8812345","email":"demo@example.com"}}"#,
        0,
    )
    .await;
    assert_eq!(h.session.risk().account(), AccountKind::Demo);

    feed(
        &mut h,
        r#"{"msg_type":"balance","balance":{"balance":10000.00,"currency":"USD","loginid":"VRTC8812345"},
            "subscription":{"id":"b7"}}"#,
        0,
    )
    .await;
    assert_eq!(h.session.risk().balance(), dec!(10000));

    // Quotes ending in 4: 6543.24, 6543.34, ...
    for (i, quote) in ["6543.24", "6543.34", "6543.44", "6543.54", "6543.64"]
        .iter()
        .enumerate()
    {
        feed(&mut h, &tick_frame(quote, 1_704_067_200 + i as i64), i as i64 + 1).await;
    }
    assert_eq!(h.session.window().len(), 5);

    let submitted = h.venue.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].kind, ContractKind::Match);
    assert_eq!(submitted[0].barrier, "4");

    feed(
        &mut h,
        r#"{"echo_req":{"buy":1,"price":10},"msg_type":"buy","req_id":1,
            "buy":{"balance_after":9990,"buy_price":10,"contract_id":240011,
                   "longcode":"Win payout if the last digit is 4.","payout":90.4}}"#,
        6,
    )
    .await;
    assert_eq!(h.venue.log().tracked, vec![240011]);

    // Subscription confirmation without a contract is ignored
    let confirmation = parse_message(
        r#"{"msg_type":"proposal_open_contract","proposal_open_contract":{}}"#,
    )
    .unwrap();
    assert!(matches!(confirmation, VenueEvent::Ignored { .. }));

    feed(
        &mut h,
        r#"{"msg_type":"proposal_open_contract",
            "proposal_open_contract":{"contract_id":240011,"is_sold":0,"profit":-10,
                                      "buy_price":10,"barrier":"4"}}"#,
        7,
    )
    .await;
    assert_eq!(h.session.stats().settled, 0);

    feed(
        &mut h,
        r#"{"msg_type":"proposal_open_contract",
            "proposal_open_contract":{"contract_id":240011,"is_sold":1,"profit":80.4,
                                      "buy_price":10,"barrier":"4","status":"won"}}"#,
        8,
    )
    .await;

    let stats = h.session.stats();
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.total_profit, dec!(80.4));

    let rows = h.sink.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].outcome, Outcome::Win);
    assert_eq!(rows[1].profit, dec!(80.4));
}

#[tokio::test]
async fn test_buy_error_frame_releases_request() {
    let mut config = base_config("consensus");
    config.coverage.depth = 1;
    let mut h = Harness::start(config).await;

    h.ticks(&[2; 5], 1).await;
    assert_eq!(h.session.book().awaiting_count(), 1);

    feed(
        &mut h,
        r#"{"echo_req":{"buy":1,"price":10},"msg_type":"buy","req_id":1,
            "error":{"code":"ContractBuyValidationError","message":"Stake is below the minimum."}}"#,
        6,
    )
    .await;

    assert_eq!(h.session.book().awaiting_count(), 0);
    let errors = h.reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "ContractBuyValidationError");
    assert_eq!(errors[0].req_id, Some(1));
}

#[tokio::test]
async fn test_ping_answer_changes_nothing() {
    let mut h = Harness::start(base_config("consensus")).await;
    feed(&mut h, r#"{"echo_req":{"ping":1},"msg_type":"ping","ping":"pong"}"#, 1).await;
    assert!(h.session.window().is_empty());
    assert!(h.reporter.snapshots().is_empty());
}
