//! Parquet trade ledger files with rotation

use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::execution::{ContractKind, Outcome, TradeRecord};

/// Ledger file name prefix
pub const LEDGER_PREFIX: &str = "trades";

/// Trade ledger schema
pub fn trade_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("trade_id", DataType::Utf8, false),
        Field::new("contract_kind", DataType::Utf8, true),
        Field::new("barrier", DataType::Utf8, false),
        Field::new("stake", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new("outcome", DataType::Utf8, false),
        Field::new("profit", DataType::Utf8, false),
    ])
}

struct OpenFile {
    path: PathBuf,
    started: DateTime<Utc>,
    writer: ArrowWriter<File>,
}

/// Appends trade batches to the current ledger file, rotating on a time interval
///
/// A file stays open across flushes (one row group per flush) and is only
/// readable once closed, on rotation or on `close`.
pub struct LedgerWriter {
    output_dir: PathBuf,
    rotation_interval: Duration,
    schema: SchemaRef,
    current: Option<OpenFile>,
}

impl LedgerWriter {
    /// Create a new ledger writer
    pub fn new(output_dir: PathBuf, rotation_interval_secs: u64) -> Self {
        Self {
            output_dir,
            rotation_interval: Duration::seconds(rotation_interval_secs as i64),
            schema: Arc::new(trade_schema()),
            current: None,
        }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Check if rotation is needed based on current time
    pub fn needs_rotation(&self, now: DateTime<Utc>) -> bool {
        match &self.current {
            None => true,
            Some(file) => now - file.started >= self.rotation_interval,
        }
    }

    /// Ledger file path for a given start time
    pub fn file_path(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!(
            "{}_{}.parquet",
            LEDGER_PREFIX,
            timestamp.format("%Y%m%d_%H%M%S")
        );
        self.output_dir.join(filename)
    }

    /// Path of the file currently open, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|f| f.path.as_path())
    }

    /// Write a batch of records, rotating first if due
    pub fn write(&mut self, records: &[TradeRecord], now: DateTime<Utc>) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if self.needs_rotation(now) {
            self.close()?;
            self.open(now)?;
        }

        let batch = self.build_batch(records)?;
        let file = self
            .current
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No open ledger file"))?;
        file.writer.write(&batch)?;
        file.writer.flush()?;

        tracing::debug!(path = ?file.path, count = records.len(), "Wrote trades to Parquet");

        Ok(())
    }

    /// Finish the current file, returning its path
    pub fn close(&mut self) -> anyhow::Result<Option<PathBuf>> {
        match self.current.take() {
            Some(file) => {
                file.writer.close()?;
                tracing::info!(path = ?file.path, "Closed ledger file");
                Ok(Some(file.path))
            }
            None => Ok(None),
        }
    }

    fn open(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.ensure_dir()?;

        let path = self.file_path(now);
        let file = File::create(&path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(file, self.schema.clone(), Some(props))?;

        tracing::info!(path = ?path, "Opened ledger file");
        self.current = Some(OpenFile {
            path,
            started: now,
            writer,
        });
        Ok(())
    }

    fn build_batch(&self, records: &[TradeRecord]) -> anyhow::Result<RecordBatch> {
        let timestamps: Vec<i64> = records
            .iter()
            .map(|r| r.timestamp.timestamp_micros())
            .collect();
        let trade_ids: Vec<String> = records.iter().map(|r| r.trade_id.to_string()).collect();
        let kinds: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.kind.map(|k| k.as_str()))
            .collect();
        let barriers: Vec<&str> = records.iter().map(|r| r.barrier.as_str()).collect();
        let stakes: Vec<String> = records.iter().map(|r| r.stake.to_string()).collect();
        let outcomes: Vec<&str> = records.iter().map(|r| r.outcome.as_str()).collect();
        let profits: Vec<String> = records.iter().map(|r| r.profit.to_string()).collect();

        let batch = RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                Arc::new(StringArray::from_iter_values(trade_ids)) as ArrayRef,
                Arc::new(StringArray::from(kinds)) as ArrayRef,
                Arc::new(StringArray::from(barriers)) as ArrayRef,
                Arc::new(StringArray::from_iter_values(stakes)) as ArrayRef,
                Arc::new(StringArray::from(outcomes)) as ArrayRef,
                Arc::new(StringArray::from_iter_values(profits)) as ArrayRef,
            ],
        )?;
        Ok(batch)
    }
}

/// Reader for ledger files
pub struct LedgerReader {
    path: PathBuf,
}

impl LedgerReader {
    /// Create a new reader for a ledger file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger files in a directory, oldest first
    pub fn list_files(dir: impl AsRef<Path>) -> anyhow::Result<Vec<PathBuf>> {
        let prefix = format!("{}_", LEDGER_PREFIX);
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "parquet")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Read all trade rows
    pub fn read(&self) -> anyhow::Result<Vec<TradeRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut records = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let timestamps = batch
                .column(0)
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column"))?;
            let trade_ids = string_column(&batch, 1, "trade_id")?;
            let kinds = string_column(&batch, 2, "contract_kind")?;
            let barriers = string_column(&batch, 3, "barrier")?;
            let stakes = string_column(&batch, 4, "stake")?;
            let outcomes = string_column(&batch, 5, "outcome")?;
            let profits = string_column(&batch, 6, "profit")?;

            for i in 0..batch.num_rows() {
                let timestamp = DateTime::from_timestamp_micros(timestamps.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?;
                let kind = if kinds.is_null(i) {
                    None
                } else {
                    Some(
                        ContractKind::from_venue(kinds.value(i))
                            .ok_or_else(|| anyhow::anyhow!("Invalid contract kind"))?,
                    )
                };
                let outcome = match outcomes.value(i) {
                    "pending" => Outcome::Pending,
                    "win" => Outcome::Win,
                    "loss" => Outcome::Loss,
                    other => anyhow::bail!("Invalid outcome {}", other),
                };

                records.push(TradeRecord {
                    trade_id: Uuid::parse_str(trade_ids.value(i))?,
                    timestamp,
                    kind,
                    barrier: barriers.value(i).to_string(),
                    stake: Decimal::from_str(stakes.value(i))?,
                    outcome,
                    profit: Decimal::from_str(profits.value(i))?,
                });
            }
        }

        Ok(records)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    index: usize,
    name: &str,
) -> anyhow::Result<&'a StringArray> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
}
