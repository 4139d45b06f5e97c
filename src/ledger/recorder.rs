//! Background trade recorder

use super::parquet::LedgerWriter;
use super::TradeSink;
use crate::config::LedgerConfig;
use crate::execution::TradeRecord;
use chrono::{Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Recording statistics
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub records_received: u64,
    pub records_written: u64,
    pub records_dropped: u64,
    pub write_errors: u64,
    pub last_flush: Option<chrono::DateTime<Utc>>,
}

/// Sends trade rows to a writer task that batches them into Parquet
///
/// Cloning shares the same writer task. The task flushes and closes the
/// current file once every clone is dropped.
#[derive(Clone)]
pub struct TradeRecorder {
    output_dir: PathBuf,
    tx: mpsc::Sender<TradeRecord>,
    stats: Arc<RwLock<RecorderStats>>,
}

impl TradeRecorder {
    /// Spawn the writer task. Await the handle after dropping every clone to
    /// make sure the last rows hit the disk.
    pub fn spawn(config: LedgerConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(10_000);
        let stats = Arc::new(RwLock::new(RecorderStats::default()));

        let writer = LedgerWriter::new(config.output_dir.clone(), config.rotation_interval_secs);
        let task_stats = stats.clone();
        let task_config = config.clone();
        let handle = tokio::spawn(async move {
            Self::run_writer(rx, writer, task_config, task_stats).await;
        });

        (
            Self {
                output_dir: config.output_dir,
                tx,
                stats,
            },
            handle,
        )
    }

    /// Run the writer task
    async fn run_writer(
        mut rx: mpsc::Receiver<TradeRecord>,
        mut writer: LedgerWriter,
        config: LedgerConfig,
        stats: Arc<RwLock<RecorderStats>>,
    ) {
        let mut buffer: Vec<TradeRecord> = Vec::with_capacity(config.buffer_size);
        let mut last_flush = Utc::now();
        let flush_interval = Duration::seconds(config.flush_interval_secs as i64);
        let timeout = tokio::time::Duration::from_secs(config.flush_interval_secs.max(1));

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Some(record) => {
                            stats.write().await.records_received += 1;
                            buffer.push(record);

                            if buffer.len() >= config.buffer_size {
                                Self::flush(&mut buffer, &mut writer, &stats).await;
                                last_flush = Utc::now();
                            }
                        }
                        None => {
                            // All senders gone, flush remaining and close the file
                            Self::flush(&mut buffer, &mut writer, &stats).await;
                            if let Err(e) = writer.close() {
                                tracing::error!(error = %e, "Failed to close ledger file");
                            }
                            tracing::info!("Trade recorder shutting down");
                            break;
                        }
                    }
                }

                _ = tokio::time::sleep(timeout) => {
                    let now = Utc::now();
                    if now - last_flush >= flush_interval && !buffer.is_empty() {
                        Self::flush(&mut buffer, &mut writer, &stats).await;
                        last_flush = now;
                    }
                }
            }
        }
    }

    /// Flush buffered rows to disk
    async fn flush(
        buffer: &mut Vec<TradeRecord>,
        writer: &mut LedgerWriter,
        stats: &Arc<RwLock<RecorderStats>>,
    ) {
        if buffer.is_empty() {
            return;
        }

        let now = Utc::now();
        let count = buffer.len();

        match writer.write(buffer, now) {
            Ok(()) => {
                let mut s = stats.write().await;
                s.records_written += count as u64;
                s.last_flush = Some(now);
                tracing::debug!(count, path = ?writer.current_path(), "Flushed trades");
            }
            Err(e) => {
                stats.write().await.write_errors += 1;
                tracing::error!(error = %e, count, "Failed to write trades");
            }
        }

        buffer.clear();
    }

    /// Get output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Get current statistics
    pub async fn stats(&self) -> RecorderStats {
        self.stats.read().await.clone()
    }
}

impl TradeSink for TradeRecorder {
    fn append(&self, record: TradeRecord) {
        if let Err(e) = self.tx.try_send(record) {
            tracing::warn!(error = %e, "Ledger queue rejected trade row");
            if let Ok(mut s) = self.stats.try_write() {
                s.records_dropped += 1;
            }
        }
    }
}
