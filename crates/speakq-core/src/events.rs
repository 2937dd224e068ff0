//! Core events emitted by the scheduler

use speakq_api::{ParticipantRef, ParticipantView};
use speakq_util::ParticipantId;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 256;

/// Events emitted by the scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    ParticipantAdded {
        participant_id: ParticipantId,
        name: String,
        position: usize,
    },

    /// Queue kicked off with these participants lined up, in position order
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
        speaking_time: Duration,
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

    /// Time-boxed turn entered its warning window
    TimeWarning {
        participant_id: ParticipantId,
        remaining: Duration,
    },

    AutoAdvanceScheduled {
        delay: Duration,
    },
}

/// Fan-out of core events to any number of subscribers.
///
/// Emitting never blocks and never retries: with no subscribers the event is
/// dropped, and a subscriber that falls behind sees a lag error on its side.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: CoreEvent) {
        trace!(event = ?event, subscribers = self.tx.receiver_count(), "Emitting core event");
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
