//! Shared utilities for speakq
//!
//! This crate provides:
//! - ID types (ParticipantId, ClientId)
//! - Time utilities (monotonic time, injectable clocks)
//! - Rate limiting helpers
//! - Default paths for socket and config files

mod ids;
mod paths;
mod rate_limit;
mod time;

pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
