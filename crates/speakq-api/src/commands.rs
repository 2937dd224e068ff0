//! Command types for the speakqd protocol

use serde::{Deserialize, Serialize};
use speakq_util::{ClientId, ParticipantId};

use crate::{HealthStatus, MeetingFormat, MeetingSettings, ParticipantView, QueueProgress, QueueSnapshot, API_VERSION};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedVersion,
    RateLimited,
    InternalError,
}

/// All possible commands from clients.
///
/// Queue commands that name an unknown participant, or a participant in an
/// incompatible state, succeed without changing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get the full queue snapshot
    GetState,

    /// Add a participant at the end of the queue
    AddParticipant { id: ParticipantId, name: String },

    /// Announce the queue and start the first waiting speaker
    StartQueue,

    /// Start a specific participant speaking
    StartSpeaking { id: ParticipantId },

    /// Start the next waiting participant now
    StartNext,

    /// End a participant's turn
    EndTurn { id: ParticipantId },

    /// End whoever is speaking
    EndCurrentTurn,

    Skip { id: ParticipantId },
    Pause { id: ParticipantId },
    Unpause { id: ParticipantId },

    /// Final order of participants, first to last
    Reorder { ids: Vec<ParticipantId> },

    Shuffle,
    Reset,
    CompleteRound,

    SetFormat { format: MeetingFormat },
    SetTimeLimit { seconds: u64 },
    SetAutoAdvance { enabled: bool },
    /// Clamped to 0..=30
    SetAutoAdvanceDelay { seconds: i64 },

    GetNextSpeaker,
    GetProgress,
    GetSettings,

    /// A chat line forwarded by the meeting host integration
    ChatMessage { text: String },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

impl Command {
    /// Whether the command can change queue state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::GetState
                | Command::GetNextSpeaker
                | Command::GetProgress
                | Command::GetSettings
                | Command::SubscribeEvents
                | Command::UnsubscribeEvents
                | Command::GetHealth
                | Command::Ping
        )
    }
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(QueueSnapshot),
    NextSpeaker { participant: Option<ParticipantView> },
    Progress(QueueProgress),
    Settings(MeetingSettings),
    ChatHandled { reply: Option<String> },
    Subscribed { client_id: ClientId },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}
