use clap::Parser;
use digit_hft::cli::{Cli, Commands};
use digit_hft::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets live in .env
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::from_toml(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    digit_hft::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            args.execute(config).await?;
        }
        Commands::Probe(args) => {
            tracing::info!("Starting venue probe");
            args.execute(&config).await?;
        }
        Commands::Ledger(args) => {
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Venue: {}", config.venue.endpoint());
            println!(
                "  Trading: {} mode={} execution={:?} duration={} ticks demo_only={}",
                config.trading.symbol,
                config.trading.mode,
                config.trading.execution,
                config.trading.duration_ticks,
                config.trading.require_demo_account
            );
            println!(
                "  Consensus: window={} min_ticks={} hold={}/{} after {} losses, {}s between bursts",
                config.consensus.window_capacity,
                config.consensus.min_ticks,
                config.consensus.hold_ticks,
                config.consensus.short_hold_ticks,
                config.consensus.short_hold_after_losses,
                config.consensus.min_seconds_between_bursts
            );
            println!(
                "  Coverage: enabled={} depth={}",
                config.coverage.enabled, config.coverage.depth
            );
            println!(
                "  Risk: {:?} stake={} pct={}% bounds=[{}, {}] stop-loss after {} losses for {}s",
                config.risk.stake_mode,
                config.risk.stake_amount,
                config.risk.risk_percentage * rust_decimal_macros::dec!(100),
                config.risk.min_stake,
                config.risk.max_stake,
                config.risk.max_consecutive_losses,
                config.risk.cooldown_secs
            );
            println!(
                "  Ledger: enabled={} dir={}",
                config.ledger.enabled,
                config.ledger.output_dir.display()
            );
        }
    }

    Ok(())
}
