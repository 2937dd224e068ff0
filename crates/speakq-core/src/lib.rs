//! Turn-scheduling engine for speakqd
//!
//! This crate is the heart of speakqd, containing:
//! - Participant state machine (Waiting -> Speaking -> Completed, plus Paused and Skipped)
//! - Format policy (standard, round robin, time box) deciding what follows a turn
//! - Deferred action scheduling for auto-advance and time-box expiry
//! - Transition events for UI and chat collaborators
//!
//! All time is read from an injected [`speakq_util::Clock`].

mod deferred;
mod events;
mod participant;
mod policy;
mod scheduler;

pub use deferred::*;
pub use events::*;
pub use participant::*;
pub use policy::*;
pub use scheduler::*;
