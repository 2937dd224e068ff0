//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use speakq_api::MeetingFormat;
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Daemon settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Meeting format defaults
    #[serde(default)]
    pub meeting: RawMeetingConfig,

    /// Chat announcement settings
    #[serde(default)]
    pub chat: RawChatConfig,

    /// Initial roster
    #[serde(default)]
    pub participants: Vec<RawParticipant>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/speakqd/speakqd.sock)
    pub socket_path: Option<PathBuf>,

    /// How often deferred actions are checked, in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Per-client IPC request budget
    pub requests_per_second: Option<u32>,
}

/// Meeting format defaults applied at startup
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMeetingConfig {
    pub format: Option<MeetingFormat>,

    /// Per-turn limit for time_box; 0 means unset
    pub time_limit_seconds: Option<u64>,

    pub auto_advance: Option<bool>,

    /// Clamped to 0..=30
    pub auto_advance_delay_seconds: Option<i64>,
}

/// Chat announcement settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawChatConfig {
    pub enabled: Option<bool>,

    /// Minimum gap between posted messages
    pub rate_limit_seconds: Option<u64>,

    /// Include completed speakers in status messages
    pub verbose: Option<bool>,

    /// Prefix that marks a chat line as a command
    pub command_prefix: Option<String>,
}

/// Roster entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawParticipant {
    pub id: String,
    pub name: String,
}
