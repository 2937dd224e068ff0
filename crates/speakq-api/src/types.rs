//! Shared types for the speakqd API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use speakq_util::ParticipantId;
use std::fmt;

/// Where a participant is in the turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Waiting,
    Speaking,
    Paused,
    Skipped,
    Completed,
}

impl ParticipantStatus {
    /// Still has a turn ahead of them in the current pass
    pub fn is_queued(&self) -> bool {
        match self {
            ParticipantStatus::Waiting | ParticipantStatus::Paused => true,
            ParticipantStatus::Speaking
            | ParticipantStatus::Skipped
            | ParticipantStatus::Completed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Waiting => "waiting",
            ParticipantStatus::Speaking => "speaking",
            ParticipantStatus::Paused => "paused",
            ParticipantStatus::Skipped => "skipped",
            ParticipantStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling policy applied when a turn ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingFormat {
    /// Single pass through the queue
    #[default]
    Standard,
    /// Repeat the queue, one round after another
    RoundRobin,
    /// Fixed time slot per speaker
    TimeBox,
}

impl MeetingFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingFormat::Standard => "standard",
            MeetingFormat::RoundRobin => "round_robin",
            MeetingFormat::TimeBox => "time_box",
        }
    }
}

impl fmt::Display for MeetingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound for the auto-advance delay
pub const MAX_AUTO_ADVANCE_DELAY_SECONDS: u32 = 30;

/// Default delay before the next speaker starts automatically
pub const DEFAULT_AUTO_ADVANCE_DELAY_SECONDS: u32 = 3;

/// Clamp a requested auto-advance delay into `0..=30` seconds
pub fn clamp_auto_advance_delay(seconds: i64) -> u32 {
    seconds.clamp(0, MAX_AUTO_ADVANCE_DELAY_SECONDS as i64) as u32
}

/// Id and display name of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub id: ParticipantId,
    pub name: String,
}

/// View of a participant for UI display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    pub position: usize,
    pub status: ParticipantStatus,
    /// Length of the most recently completed turn
    pub speaking_time_seconds: u64,
    /// Wall-clock start of the current turn, while speaking
    pub turn_started_at: Option<DateTime<Local>>,
}

/// Queue progress counters. Skipped and paused participants count as remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// Active meeting format settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSettings {
    pub format: MeetingFormat,
    pub time_limit_seconds: u64,
    pub current_round: u32,
    pub auto_advance_enabled: bool,
}

/// Full queue state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub api_version: u32,
    /// Participants in position order
    pub participants: Vec<ParticipantView>,
    pub current_speaker: Option<ParticipantId>,
    pub settings: MeetingSettings,
    pub auto_advance_delay_seconds: u32,
    pub progress: QueueProgress,
    /// Seconds until a pending auto-advance fires, 0 if none
    pub auto_advance_countdown: u64,
    /// Seconds left in the current time-boxed turn
    pub time_remaining: Option<u64>,
    pub time_warning: bool,
    pub queue_complete: bool,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub participant_count: usize,
}
