//! Reconnecting websocket transport
//!
//! One background task owns the socket. The session loop sees inbound text
//! frames and connection status on one channel and queues outbound requests
//! on another, so it never touches the socket directly.

use super::types::{Backoff, WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Capacity of the inbound event channel
const INBOUND_CAPACITY: usize = 1024;
/// Capacity of the outbound request queue
const OUTBOUND_CAPACITY: usize = 256;

/// What the socket task does after handling one frame
enum Flow {
    Continue,
    /// Local side is gone, stop without reconnecting
    Stop,
}

/// Websocket client with automatic reconnection
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Spawn the socket task
    ///
    /// Returns the inbound event receiver and the outbound request sender.
    /// Requests still queued when a new connection opens belong to the lost
    /// one and are dropped; callers resend after `Connected`. Dropping every
    /// sender closes the socket for good.
    pub fn connect(&self) -> (mpsc::Receiver<WsMessage>, mpsc::Sender<String>) {
        let (event_tx, event_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (request_tx, request_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_loop(config, event_tx, request_rx).await {
                tracing::error!(error = %e, "Websocket task stopped");
            }
        });

        (event_rx, request_tx)
    }

    async fn run_loop(
        config: WsConfig,
        events: mpsc::Sender<WsMessage>,
        mut requests: mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        let mut backoff = Backoff::new(config.initial_reconnect_delay, config.max_reconnect_delay);

        loop {
            let error = match Self::session(&config, &events, &mut requests, &mut backoff).await {
                Ok(()) => {
                    tracing::info!("Websocket closed locally");
                    let _ = events.send(WsMessage::Disconnected).await;
                    return Ok(());
                }
                Err(e) => e,
            };

            let delay = backoff.next_delay();
            let attempt = backoff.attempts();
            tracing::warn!(
                error = %error,
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Websocket dropped, reconnecting"
            );

            // 0 = retry forever
            if config.max_reconnect_attempts > 0 && attempt >= config.max_reconnect_attempts {
                tracing::error!(attempt, "Giving up on reconnecting");
                let _ = events.send(WsMessage::Disconnected).await;
                return Err(WsError::MaxReconnectsExceeded);
            }

            if events.send(WsMessage::Reconnecting { attempt }).await.is_err() {
                tracing::info!("Event receiver dropped, not reconnecting");
                return Ok(());
            }
            sleep(delay).await;
        }
    }

    /// One connection lifetime. `Ok` means the local side shut down.
    async fn session(
        config: &WsConfig,
        events: &mpsc::Sender<WsMessage>,
        requests: &mut mpsc::Receiver<String>,
        backoff: &mut Backoff,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting");
        let (socket, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = socket.split();

        tracing::info!("Websocket connected");
        backoff.reset();
        let stale = Self::discard_queued(requests);
        if stale > 0 {
            tracing::warn!(stale, "Dropped requests queued for the previous connection");
        }
        if events.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        loop {
            tokio::select! {
                frame = read.next() => {
                    let frame = frame
                        .ok_or_else(|| WsError::ConnectionFailed("stream ended".into()))?
                        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

                    let flow = match frame {
                        Message::Text(text) => Self::forward(events, text).await,
                        Message::Ping(payload) => {
                            write
                                .send(Message::Pong(payload))
                                .await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                            Flow::Continue
                        }
                        Message::Close(frame) => {
                            tracing::info!(?frame, "Server closed the connection");
                            return Err(WsError::ConnectionFailed("closed by server".into()));
                        }
                        other => {
                            tracing::trace!(len = other.len(), "Ignoring non-text frame");
                            Flow::Continue
                        }
                    };
                    if let Flow::Stop = flow {
                        return Ok(());
                    }
                }

                request = requests.recv() => {
                    let Some(text) = request else {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    };
                    write
                        .send(Message::Text(text))
                        .await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                }
            }
        }
    }

    fn discard_queued(requests: &mut mpsc::Receiver<String>) -> usize {
        let mut discarded = 0;
        while requests.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    async fn forward(events: &mpsc::Sender<WsMessage>, text: String) -> Flow {
        match events.send(WsMessage::Text(text)).await {
            Ok(()) => Flow::Continue,
            Err(_) => {
                tracing::debug!("Event receiver dropped, closing");
                Flow::Stop
            }
        }
    }
}
