//! CLI interface for digit-hft
//!
//! Provides subcommands for:
//! - `run`: Start a trading session (paper or live)
//! - `probe`: Connect, authorize and print raw venue frames
//! - `ledger`: Summarize recorded trade files
//! - `config`: Show the effective configuration

mod ledger;
mod probe;
mod run;

pub use ledger::LedgerArgs;
pub use probe::ProbeArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "digit-hft")]
#[command(about = "Tick-driven digit contract trading client for the Deriv websocket API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a trading session
    Run(RunArgs),
    /// Connect, authorize and print venue frames
    Probe(ProbeArgs),
    /// Summarize recorded trade files
    Ledger(LedgerArgs),
    /// Show configuration
    Config,
}
