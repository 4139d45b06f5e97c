//! Signal generation module
//!
//! Tick digit history, digit heuristics and their weighted consensus

mod consensus;
pub mod strategies;
mod types;
mod window;

pub use consensus::{tally, ConsensusEngine, StrategyWeights};
pub use strategies::StrategyParams;
pub use types::{
    Decision, Digit, DigitSet, SignalError, StrategyKind, StrategyPerformance, StrategyVote,
};
pub use window::{TickWindow, DEFAULT_CAPACITY};
