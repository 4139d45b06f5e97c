//! Trade ledger module
//!
//! Append-only record of every placement and settlement, stored as Parquet

mod parquet;
mod recorder;

pub use self::parquet::{trade_schema, LedgerReader, LedgerWriter, LEDGER_PREFIX};
pub use recorder::{RecorderStats, TradeRecorder};

use crate::execution::TradeRecord;

/// Destination for trade rows
///
/// Appends never block the caller.
pub trait TradeSink: Send + Sync {
    fn append(&self, record: TradeRecord);
}

/// Sink used when the ledger is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TradeSink for NullSink {
    fn append(&self, _record: TradeRecord) {}
}
