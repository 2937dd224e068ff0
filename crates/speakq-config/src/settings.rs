//! Validated configuration structures

use crate::schema::{RawChatConfig, RawConfig, RawMeetingConfig, RawParticipant, RawServiceConfig};
use speakq_api::{clamp_auto_advance_delay, MeetingFormat, DEFAULT_AUTO_ADVANCE_DELAY_SECONDS};
use speakq_util::{socket_path_without_env, ParticipantId};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default tick interval for firing deferred actions
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default per-client IPC request budget
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 30;

/// Default minimum gap between chat messages
pub const DEFAULT_CHAT_RATE_LIMIT_SECONDS: u64 = 10;

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    pub service: ServiceConfig,
    pub meeting: MeetingConfig,
    pub chat: ChatConfig,
    /// Initial roster, in queue order
    pub participants: Vec<ParticipantSeed>,
}

impl QueueConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            meeting: MeetingConfig::from_raw(raw.meeting),
            chat: ChatConfig::from_raw(raw.chat),
            participants: raw.participants.into_iter().map(ParticipantSeed::from_raw).collect(),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub tick_interval: Duration,
    pub requests_per_second: u32,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(socket_path_without_env),
            tick_interval: Duration::from_millis(
                raw.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS),
            ),
            requests_per_second: raw
                .requests_per_second
                .unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Meeting defaults applied to the scheduler at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingConfig {
    pub format: MeetingFormat,
    /// 0 means unset
    pub time_limit_seconds: u64,
    pub auto_advance: bool,
    /// Always within 0..=30
    pub auto_advance_delay_seconds: u32,
}

impl MeetingConfig {
    fn from_raw(raw: RawMeetingConfig) -> Self {
        let auto_advance_delay_seconds = match raw.auto_advance_delay_seconds {
            Some(requested) => {
                let clamped = clamp_auto_advance_delay(requested);
                if clamped as i64 != requested {
                    warn!(requested, clamped, "auto_advance_delay_seconds out of range, clamped");
                }
                clamped
            }
            None => DEFAULT_AUTO_ADVANCE_DELAY_SECONDS,
        };

        Self {
            format: raw.format.unwrap_or_default(),
            time_limit_seconds: raw.time_limit_seconds.unwrap_or(0),
            auto_advance: raw.auto_advance.unwrap_or(true),
            auto_advance_delay_seconds,
        }
    }
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self::from_raw(RawMeetingConfig::default())
    }
}

/// Chat announcement configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub enabled: bool,
    pub rate_limit: Duration,
    pub verbose: bool,
    pub command_prefix: String,
}

impl ChatConfig {
    fn from_raw(raw: RawChatConfig) -> Self {
        Self {
            enabled: raw.enabled.unwrap_or(true),
            rate_limit: Duration::from_secs(
                raw.rate_limit_seconds.unwrap_or(DEFAULT_CHAT_RATE_LIMIT_SECONDS),
            ),
            verbose: raw.verbose.unwrap_or(false),
            command_prefix: raw.command_prefix.unwrap_or_else(|| "!".to_string()),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from_raw(RawChatConfig::default())
    }
}

/// Participant supplied by the initial roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSeed {
    pub id: ParticipantId,
    pub name: String,
}

impl ParticipantSeed {
    fn from_raw(raw: RawParticipant) -> Self {
        Self {
            id: ParticipantId::new(raw.id),
            name: raw.name,
        }
    }
}
