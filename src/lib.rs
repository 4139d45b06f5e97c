//! digit-hft: Tick-driven digit contract trading client
//!
//! This library provides the core components for:
//! - Websocket connectivity to the Deriv API with automatic reconnection
//! - Decoding of ticks, balances, purchases and contract settlements
//! - Digit strategies and their weighted consensus
//! - Hold gating and coverage scheduling of placements
//! - Hedge, random and higher/lower selection modes
//! - Paper/live execution
//! - Stake sizing and stop-loss risk control
//! - Trade ledger in Parquet
//! - Full observability stack

pub mod cli;
pub mod config;
pub mod engine;
pub mod execution;
pub mod feed;
pub mod ledger;
pub mod report;
pub mod risk;
pub mod signal;
pub mod telemetry;
pub mod ws;
