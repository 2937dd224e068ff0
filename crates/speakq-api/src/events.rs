//! Event types for speakqd -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use speakq_util::ParticipantId;

use crate::{ParticipantRef, ParticipantView, QueueSnapshot, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: speakq_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent after every queue change)
    StateChanged(QueueSnapshot),

    ParticipantAdded {
        participant: ParticipantRef,
        position: usize,
    },

    /// Queue kicked off; lists who is lined up
    QueueStarted {
        upcoming: Vec<ParticipantView>,
    },

    SpeakerStarted {
        participant_id: ParticipantId,
        name: String,
    },

    SpeakerEnded {
        participant_id: ParticipantId,
        name: String,
        speaking_time_seconds: u64,
        next_up: Option<ParticipantRef>,
    },

    Skipped {
        participant_id: ParticipantId,
        name: String,
        next_up: Option<ParticipantRef>,
    },

    RoundAdvanced {
        round: u32,
    },

    QueueCompleted,

    QueueReset,

    /// Time-boxed turn is about to run out
    TimeWarning {
        participant_id: ParticipantId,
        remaining_seconds: u64,
    },

    /// Next speaker will start automatically after the delay
    AutoAdvanceScheduled {
        delay_seconds: u64,
    },

    /// Status message posted for the meeting chat
    ChatMessage {
        text: String,
    },

    /// Service is shutting down
    Shutdown,
}
