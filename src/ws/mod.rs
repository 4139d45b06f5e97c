//! WebSocket client library
//!
//! Provides a bidirectional WebSocket client with automatic reconnection
//! and exponential backoff.

mod client;
mod types;

pub use client::WsClient;
pub use types::{Backoff, WsConfig, WsError, WsMessage};
