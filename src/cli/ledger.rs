//! Ledger command implementation

use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::config::Config;
use crate::execution::{Outcome, TradeRecord};
use crate::ledger::LedgerReader;

#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Ledger directory (defaults to ledger.output_dir)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

/// Totals over a set of ledger rows
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LedgerSummary {
    pub placements: usize,
    pub wins: usize,
    pub losses: usize,
    pub net_profit: Decimal,
}

impl LedgerSummary {
    pub fn from_records(records: &[TradeRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    fn add(&mut self, record: &TradeRecord) {
        match record.outcome {
            Outcome::Pending => self.placements += 1,
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.net_profit += record.profit;
    }

    fn merge(&mut self, other: &LedgerSummary) {
        self.placements += other.placements;
        self.wins += other.wins;
        self.losses += other.losses;
        self.net_profit += other.net_profit;
    }
}

impl LedgerArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| config.ledger.output_dir.clone());
        let files = LedgerReader::list_files(&dir)?;

        if files.is_empty() {
            println!("No ledger files in {}", dir.display());
            return Ok(());
        }

        let mut total = LedgerSummary::default();
        for path in files {
            let records = LedgerReader::new(&path).read()?;
            let summary = LedgerSummary::from_records(&records);
            println!(
                "{}: placed={} wins={} losses={} net={}",
                path.display(),
                summary.placements,
                summary.wins,
                summary.losses,
                summary.net_profit
            );
            total.merge(&summary);
        }

        println!(
            "Total: placed={} wins={} losses={} net={}",
            total.placements, total.wins, total.losses, total.net_profit
        );
        Ok(())
    }
}
