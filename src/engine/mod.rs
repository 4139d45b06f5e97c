//! Trading engine module
//!
//! Hold gate, coverage scheduling, per-mode selectors, contract book and the
//! session that ties them to the venue

mod book;
mod hedge;
mod hilo;
mod hold;
mod random;
mod scheduler;
mod session;

pub use book::{Acknowledged, ContractBook, GroupProgress, OpenTrade, Settlement};
pub use hedge::{split_stakes, HedgePlan, HedgeSelector};
pub use hilo::{HiLoLeg, HiLoSelector};
pub use hold::{HoldGate, HoldState};
pub use random::RandomSelector;
pub use scheduler::{CoverageScheduler, PendingTrade};
pub use session::Session;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Random generator for one selector, reproducible when a seed is configured
pub fn seeded_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}
