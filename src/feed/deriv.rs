//! Deriv websocket API message decoding

use super::types::{ContractUpdate, FeedError, Tick, VenueError, VenueEvent};
use crate::execution::RequestId;
use crate::signal::Digit;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Common envelope of every inbound frame
///
/// Bodies stay raw until `msg_type` says which one to decode.
#[derive(Debug, Deserialize)]
struct Envelope {
    msg_type: Option<String>,
    req_id: Option<RequestId>,
    error: Option<ErrorBody>,
    authorize: Option<Value>,
    balance: Option<Value>,
    tick: Option<Value>,
    buy: Option<Value>,
    proposal_open_contract: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizeBody {
    loginid: String,
}

#[derive(Debug, Deserialize)]
struct BalanceBody {
    balance: Number,
}

#[derive(Debug, Deserialize)]
struct TickBody {
    symbol: String,
    quote: Value,
    epoch: i64,
}

#[derive(Debug, Deserialize)]
struct BuyBody {
    contract_id: u64,
    buy_price: Number,
}

#[derive(Debug, Deserialize)]
struct OpenContractBody {
    contract_id: Option<u64>,
    #[serde(default)]
    is_sold: u8,
    profit: Option<Number>,
    buy_price: Option<Number>,
    barrier: Option<Value>,
}

/// Decode one text frame into a venue event
pub fn parse_message(text: &str) -> Result<VenueEvent, FeedError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let msg_type = envelope.msg_type.ok_or(FeedError::MissingMsgType)?;

    if let Some(error) = envelope.error {
        return Ok(VenueEvent::Error(VenueError {
            code: error.code,
            message: error.message,
            req_id: envelope.req_id,
            msg_type,
        }));
    }

    match msg_type.as_str() {
        "authorize" => {
            let body: AuthorizeBody = decode_body("authorize", envelope.authorize)?;
            Ok(VenueEvent::Authorized {
                login_id: body.loginid,
            })
        }
        "balance" => {
            let body: BalanceBody = decode_body("balance", envelope.balance)?;
            Ok(VenueEvent::Balance {
                balance: to_decimal("balance", &body.balance)?,
            })
        }
        "tick" => {
            let body: TickBody = decode_body("tick", envelope.tick)?;
            let rendered = render_quote(&body.quote)?;
            Ok(VenueEvent::Tick(Tick {
                digit: quote_digit(&rendered)?,
                quote: parse_decimal("quote", &rendered)?,
                symbol: body.symbol,
                epoch: body.epoch,
            }))
        }
        "buy" => {
            let body: BuyBody = decode_body("buy", envelope.buy)?;
            Ok(VenueEvent::BuyAck {
                req_id: envelope.req_id,
                contract_id: body.contract_id,
                buy_price: to_decimal("buy_price", &body.buy_price)?,
            })
        }
        "proposal_open_contract" => {
            let body: OpenContractBody =
                decode_body("proposal_open_contract", envelope.proposal_open_contract)?;
            // The subscription confirmation arrives without a contract
            let Some(contract_id) = body.contract_id else {
                return Ok(VenueEvent::Ignored { msg_type });
            };
            Ok(VenueEvent::ContractUpdate(ContractUpdate {
                contract_id,
                is_sold: body.is_sold != 0,
                profit: optional_decimal("profit", body.profit.as_ref())?,
                buy_price: optional_decimal("buy_price", body.buy_price.as_ref())?,
                barrier: body.barrier.map(barrier_text),
            }))
        }
        "ping" => Ok(VenueEvent::Pong),
        _ => Ok(VenueEvent::Ignored { msg_type }),
    }
}

fn decode_body<T: DeserializeOwned>(
    field: &'static str,
    body: Option<Value>,
) -> Result<T, FeedError> {
    let body = body.ok_or(FeedError::MissingField(field))?;
    Ok(serde_json::from_value(body)?)
}

/// Shortest decimal rendering of a quote
///
/// Numbers render without trailing zeros (`6543.20` becomes `6543.2`).
/// String quotes are taken verbatim.
pub fn render_quote(quote: &Value) -> Result<String, FeedError> {
    match quote {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => Err(FeedError::MalformedQuote(other.to_string())),
    }
}

/// Trailing digit of a rendered quote
pub fn quote_digit(rendered: &str) -> Result<Digit, FeedError> {
    Digit::trailing(rendered).ok_or_else(|| FeedError::MalformedQuote(rendered.to_string()))
}

fn to_decimal(field: &'static str, value: &Number) -> Result<Decimal, FeedError> {
    parse_decimal(field, &value.to_string())
}

fn parse_decimal(field: &'static str, text: &str) -> Result<Decimal, FeedError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| FeedError::InvalidNumber {
            field,
            value: text.to_string(),
        })
}

fn optional_decimal(field: &'static str, value: Option<&Number>) -> Result<Decimal, FeedError> {
    value.map_or(Ok(Decimal::ZERO), |v| to_decimal(field, v))
}

fn barrier_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
