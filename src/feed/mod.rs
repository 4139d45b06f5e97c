//! Venue feed module
//!
//! Decodes Deriv websocket frames into venue events and keeps the
//! connection alive

pub mod deriv;
mod heartbeat;
mod types;

pub use deriv::parse_message;
pub use heartbeat::{spawn_heartbeat, PING_FRAME};
pub use types::{ContractUpdate, FeedError, Tick, VenueError, VenueEvent};
