//! speakqd service internals
//!
//! The binary owns the sockets, signals and timers. This library holds the
//! parts that only need a scheduler:
//! - Dispatching protocol commands
//! - Running chat commands and announcing queue changes
//! - Mapping engine events onto the wire protocol

mod chat;
mod dispatch;
mod relay;

pub use chat::*;
pub use dispatch::*;
pub use relay::*;
