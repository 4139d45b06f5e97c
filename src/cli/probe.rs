//! Probe command implementation

use clap::Args;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

use crate::config::Config;
use crate::execution::{DerivVenue, ExecutionVenue};
use crate::feed::parse_message;
use crate::ws::{WsClient, WsConfig, WsMessage};

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Seconds to print frames for
    #[arg(short, long, default_value_t = 10)]
    pub seconds: u64,
}

impl ProbeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let token = config.venue.api_token()?;
        let client = WsClient::new(WsConfig::from_venue(&config.venue).max_reconnects(1));
        println!("Probing {}", client.url());

        let (mut inbound, outbound) = client.connect();
        let venue = DerivVenue::new(outbound);
        let deadline = Instant::now() + Duration::from_secs(self.seconds);
        let mut frames = 0usize;

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else { break };
                    match message {
                        WsMessage::Connected => {
                            println!("Connected, authorizing");
                            venue.authorize(&token).await?;
                            venue.subscribe_ticks(&config.trading.symbol).await?;
                        }
                        WsMessage::Text(text) => {
                            frames += 1;
                            println!("<- {}", text);
                            match parse_message(&text) {
                                Ok(event) => println!("   {:?}", event),
                                Err(e) => println!("   parse error: {}", e),
                            }
                        }
                        WsMessage::Disconnected => {
                            println!("Disconnected");
                            break;
                        }
                        WsMessage::Reconnecting { attempt } => println!("Reconnecting ({})", attempt),
                    }
                }
                _ = sleep_until(deadline) => break,
            }
        }

        println!("{} frames received", frames);
        Ok(())
    }
}
