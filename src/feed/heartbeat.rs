//! Application-level keep-alive

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Keep-alive request frame
pub const PING_FRAME: &str = r#"{"ping":1}"#;

/// Spawn a task that queues a ping frame every `interval`
///
/// The task only writes to the outbound channel and exits once the channel
/// closes. A full channel skips that beat.
pub fn spawn_heartbeat(outbound: mpsc::Sender<String>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match outbound.try_send(PING_FRAME.to_string()) {
                Ok(()) => tracing::trace!("Heartbeat sent"),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Outbound queue full, heartbeat skipped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!("Outbound channel closed, stopping heartbeat");
                    break;
                }
            }
        }
    })
}
