//! Chat collaborator for speakqd
//!
//! Turns queue transitions into short chat announcements and reads
//! `!command` style messages back out of the chat.

mod announcer;
mod command;
mod format;

pub use announcer::*;
pub use command::*;
pub use format::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Failed to post chat message: {0}")]
    PostFailed(String),

    #[error("Chat sink closed")]
    SinkClosed,
}

pub type ChatResult<T> = Result<T, ChatError>;
