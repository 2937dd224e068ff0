//! Format policy: what happens when a turn ends
//!
//! Pure decision logic. The scheduler applies the returned [`NextAction`].

use speakq_api::{
    clamp_auto_advance_delay, MeetingFormat, MeetingSettings, ParticipantStatus,
    DEFAULT_AUTO_ADVANCE_DELAY_SECONDS,
};
use speakq_config::MeetingConfig;
use speakq_util::ParticipantId;
use std::time::Duration;
use tracing::trace;

use crate::Participant;

/// Remaining seconds at or below which a time-boxed turn is in its warning window
pub const TIME_WARNING_SECONDS: u64 = 5;

/// Format settings the policy is parameterized by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSettings {
    pub format: MeetingFormat,
    /// Only meaningful for time box; 0 means unset
    pub time_limit_seconds: u64,
    pub auto_advance_enabled: bool,
    /// Always within 0..=30
    pub auto_advance_delay_seconds: u32,
}

impl FormatSettings {
    /// Time limit for the time-box format, if one applies
    pub fn time_box_limit(&self) -> Option<Duration> {
        match self.format {
            MeetingFormat::TimeBox if self.time_limit_seconds > 0 => {
                Some(Duration::from_secs(self.time_limit_seconds))
            }
            _ => None,
        }
    }

    pub fn to_meeting_settings(&self, current_round: u32) -> MeetingSettings {
        MeetingSettings {
            format: self.format,
            time_limit_seconds: self.time_limit_seconds,
            current_round,
            auto_advance_enabled: self.auto_advance_enabled,
        }
    }
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            format: MeetingFormat::Standard,
            time_limit_seconds: 0,
            auto_advance_enabled: true,
            auto_advance_delay_seconds: DEFAULT_AUTO_ADVANCE_DELAY_SECONDS,
        }
    }
}

impl From<&MeetingConfig> for FormatSettings {
    fn from(config: &MeetingConfig) -> Self {
        Self {
            format: config.format,
            time_limit_seconds: config.time_limit_seconds,
            auto_advance_enabled: config.auto_advance,
            auto_advance_delay_seconds: clamp_auto_advance_delay(
                config.auto_advance_delay_seconds as i64,
            ),
        }
    }
}

/// Decision returned by the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Leave the floor empty
    Idle,
    /// Start this participant within the same transition
    StartNow(ParticipantId),
    /// Start whoever is next once the delay elapses
    StartAfter(Duration),
    /// Requeue everyone who completed and start `first` immediately
    NewRound { first: ParticipantId },
}

/// The waiting participant with the smallest position
pub fn next_waiting(participants: &[Participant]) -> Option<&Participant> {
    participants
        .iter()
        .filter(|p| p.status == ParticipantStatus::Waiting)
        .min_by_key(|p| p.position)
}

/// Decide what follows the end of `just_ended`'s turn
pub fn on_turn_ended(
    settings: &FormatSettings,
    participants: &[Participant],
    just_ended: &ParticipantId,
) -> NextAction {
    trace!(participant_id = %just_ended, format = %settings.format, "Consulting format policy");

    match settings.format {
        MeetingFormat::Standard => advance_if_any(settings, participants),

        MeetingFormat::RoundRobin => {
            if next_waiting(participants).is_some() {
                return advance_if_any(settings, participants);
            }
            // New rounds start immediately, regardless of auto-advance settings
            participants
                .iter()
                .filter(|p| p.status == ParticipantStatus::Completed)
                .min_by_key(|p| p.position)
                .map(|first| NextAction::NewRound {
                    first: first.id.clone(),
                })
                .unwrap_or(NextAction::Idle)
        }

        MeetingFormat::TimeBox => {
            if settings.time_limit_seconds == 0 {
                return advance_if_any(settings, participants);
            }
            // Strict pacing: ignore auto-advance settings entirely
            next_waiting(participants)
                .map(|next| NextAction::StartNow(next.id.clone()))
                .unwrap_or(NextAction::Idle)
        }
    }
}

fn advance_if_any(settings: &FormatSettings, participants: &[Participant]) -> NextAction {
    if !settings.auto_advance_enabled {
        return NextAction::Idle;
    }

    match next_waiting(participants) {
        None => NextAction::Idle,
        Some(next) if settings.auto_advance_delay_seconds == 0 => {
            NextAction::StartNow(next.id.clone())
        }
        Some(_) => NextAction::StartAfter(Duration::from_secs(u64::from(
            settings.auto_advance_delay_seconds,
        ))),
    }
}
