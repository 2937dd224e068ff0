//! Engine events onto the wire

use speakq_api::{Event, EventPayload, ParticipantRef};
use speakq_chat::{ChatResult, ChatSink};
use speakq_core::CoreEvent;
use speakq_ipc::IpcServer;
use std::sync::Arc;

/// Protocol payload for a core event
pub fn event_payload(event: &CoreEvent) -> EventPayload {
    match event {
        CoreEvent::ParticipantAdded {
            participant_id,
            name,
            position,
        } => EventPayload::ParticipantAdded {
            participant: ParticipantRef {
                id: participant_id.clone(),
                name: name.clone(),
            },
            position: *position,
        },
        CoreEvent::QueueStarted { upcoming } => EventPayload::QueueStarted {
            upcoming: upcoming.clone(),
        },
        CoreEvent::SpeakerStarted {
            participant_id,
            name,
        } => EventPayload::SpeakerStarted {
            participant_id: participant_id.clone(),
            name: name.clone(),
        },
        CoreEvent::SpeakerEnded {
            participant_id,
            name,
            speaking_time,
            next_up,
        } => EventPayload::SpeakerEnded {
            participant_id: participant_id.clone(),
            name: name.clone(),
            speaking_time_seconds: speaking_time.as_secs(),
            next_up: next_up.clone(),
        },
        CoreEvent::Skipped {
            participant_id,
            name,
            next_up,
        } => EventPayload::Skipped {
            participant_id: participant_id.clone(),
            name: name.clone(),
            next_up: next_up.clone(),
        },
        CoreEvent::RoundAdvanced { round } => EventPayload::RoundAdvanced { round: *round },
        CoreEvent::QueueCompleted => EventPayload::QueueCompleted,
        CoreEvent::QueueReset => EventPayload::QueueReset,
        CoreEvent::TimeWarning {
            participant_id,
            remaining,
        } => EventPayload::TimeWarning {
            participant_id: participant_id.clone(),
            remaining_seconds: remaining.as_secs(),
        },
        CoreEvent::AutoAdvanceScheduled { delay } => EventPayload::AutoAdvanceScheduled {
            delay_seconds: delay.as_secs(),
        },
    }
}

/// Chat sink that hands messages to event subscribers, which relay them
/// into the meeting chat
pub struct IpcChatSink {
    ipc: Arc<IpcServer>,
}

impl IpcChatSink {
    pub fn new(ipc: Arc<IpcServer>) -> Self {
        Self { ipc }
    }
}

impl ChatSink for IpcChatSink {
    fn post(&self, message: &str) -> ChatResult<()> {
        self.ipc.broadcast_event(Event::new(EventPayload::ChatMessage {
            text: message.to_string(),
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakq_util::ParticipantId;
    use std::time::Duration;

    #[test]
    fn test_speaker_ended_reports_whole_seconds() {
        let payload = event_payload(&CoreEvent::SpeakerEnded {
            participant_id: ParticipantId::new("1"),
            name: "John".into(),
            speaking_time: Duration::from_secs(65),
            next_up: None,
        });

        match payload {
            EventPayload::SpeakerEnded {
                speaking_time_seconds,
                next_up,
                ..
            } => {
                assert_eq!(speaking_time_seconds, 65);
                assert!(next_up.is_none());
            }
            other => panic!("Unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_added_participant_payload() {
        let payload = event_payload(&CoreEvent::ParticipantAdded {
            participant_id: ParticipantId::new("7"),
            name: "Jane".into(),
            position: 2,
        });

        match payload {
            EventPayload::ParticipantAdded {
                participant,
                position,
            } => {
                assert_eq!(participant.id.as_str(), "7");
                assert_eq!(participant.name, "Jane");
                assert_eq!(position, 2);
            }
            other => panic!("Unexpected payload {:?}", other),
        }
    }
}
