//! Participant record and per-turn bookkeeping

use chrono::{DateTime, Local};
use speakq_api::{ParticipantRef, ParticipantStatus, ParticipantView};
use speakq_util::{MonotonicInstant, ParticipantId};
use std::time::Duration;

/// A participant in the queue
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,

    /// Dense zero-based rank used for turn order
    pub position: usize,

    pub status: ParticipantStatus,

    /// Length of the most recently completed turn, whole seconds
    pub speaking_time: Duration,

    /// Monotonic start of the current turn (for enforcement)
    pub turn_started_at: Option<MonotonicInstant>,

    /// Wall-clock start of the current turn (for display)
    pub turn_started_wall: Option<DateTime<Local>>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            status: ParticipantStatus::Waiting,
            speaking_time: Duration::ZERO,
            turn_started_at: None,
            turn_started_wall: None,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.status == ParticipantStatus::Speaking
    }

    pub(crate) fn begin_turn(&mut self, now: MonotonicInstant, wall: DateTime<Local>) {
        self.status = ParticipantStatus::Speaking;
        self.turn_started_at = Some(now);
        self.turn_started_wall = Some(wall);
    }

    /// Close the current turn as completed, recording its length truncated
    /// to whole seconds. Returns `None` if the participant is not speaking.
    pub(crate) fn finish_turn(&mut self, now: MonotonicInstant) -> Option<Duration> {
        if !self.is_speaking() {
            return None;
        }
        let started = self.turn_started_at.take()?;
        self.turn_started_wall = None;

        let speaking_time = Duration::from_secs(now.duration_since(started).as_secs());
        self.speaking_time = speaking_time;
        self.status = ParticipantStatus::Completed;

        Some(speaking_time)
    }

    /// Drop the current turn without crediting any speaking time
    pub(crate) fn abandon_turn(&mut self) {
        self.turn_started_at = None;
        self.turn_started_wall = None;
    }

    pub(crate) fn reset(&mut self) {
        self.status = ParticipantStatus::Waiting;
        self.speaking_time = Duration::ZERO;
        self.abandon_turn();
    }

    /// Time spent in the current turn so far
    pub fn turn_elapsed(&self, now: MonotonicInstant) -> Option<Duration> {
        self.turn_started_at.map(|started| now.duration_since(started))
    }

    pub fn to_ref(&self) -> ParticipantRef {
        ParticipantRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn to_view(&self) -> ParticipantView {
        ParticipantView {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            status: self.status,
            speaking_time_seconds: self.speaking_time.as_secs(),
            turn_started_at: self.turn_started_wall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant_is_waiting() {
        let p = Participant::new(ParticipantId::new("1"), "John", 0);
        assert_eq!(p.status, ParticipantStatus::Waiting);
        assert_eq!(p.speaking_time, Duration::ZERO);
        assert!(p.turn_started_at.is_none());
    }

    #[test]
    fn test_turn_time_is_truncated_to_seconds() {
        let mut p = Participant::new(ParticipantId::new("1"), "John", 0);
        let start = MonotonicInstant::now();
        p.begin_turn(start, speakq_util::now());
        assert!(p.is_speaking());

        let spoken = p.finish_turn(start + Duration::from_millis(12_900));
        assert_eq!(spoken, Some(Duration::from_secs(12)));
        assert_eq!(p.status, ParticipantStatus::Completed);
        assert!(p.turn_started_at.is_none());
        assert!(p.turn_started_wall.is_none());
    }

    #[test]
    fn test_finish_requires_speaking() {
        let mut p = Participant::new(ParticipantId::new("1"), "John", 0);
        assert!(p.finish_turn(MonotonicInstant::now()).is_none());
        assert_eq!(p.status, ParticipantStatus::Waiting);
    }

    #[test]
    fn test_speaking_time_is_set_not_accumulated() {
        let mut p = Participant::new(ParticipantId::new("1"), "John", 0);
        let start = MonotonicInstant::now();

        p.begin_turn(start, speakq_util::now());
        p.finish_turn(start + Duration::from_secs(40));

        let second = start + Duration::from_secs(100);
        p.begin_turn(second, speakq_util::now());
        p.finish_turn(second + Duration::from_secs(5));

        assert_eq!(p.speaking_time, Duration::from_secs(5));
    }
}
