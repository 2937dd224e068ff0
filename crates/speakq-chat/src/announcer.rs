//! Rate-limited queue announcements

use speakq_config::ChatConfig;
use speakq_core::CoreEvent;
use speakq_util::{Clock, RateLimiter};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{format, ChatResult};

/// Destination for chat messages
pub trait ChatSink: Send + Sync {
    fn post(&self, message: &str) -> ChatResult<()>;
}

/// Posts queue announcements to a [`ChatSink`].
///
/// At most one message goes out per rate-limit window, counted from the last
/// successful post; anything arriving inside the window is dropped, not
/// queued. Sink failures are logged, the message is lost and the window
/// stays open.
pub struct Announcer {
    sink: Box<dyn ChatSink>,
    limiter: RateLimiter<()>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    verbose: bool,
    posted: u64,
    last_message: Option<String>,
}

impl Announcer {
    pub fn new(config: &ChatConfig, sink: Box<dyn ChatSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            limiter: RateLimiter::new(1, config.rate_limit),
            clock,
            enabled: config.enabled,
            verbose: config.verbose,
            posted: 0,
            last_message: None,
        }
    }

    /// The announcement for a core event, if it warrants one
    pub fn message_for(event: &CoreEvent) -> Option<String> {
        match event {
            CoreEvent::QueueStarted { upcoming } => Some(format::queue_started(upcoming)),
            CoreEvent::SpeakerEnded {
                name,
                speaking_time,
                next_up,
                ..
            } => Some(format::speaker_change(
                name,
                *speaking_time,
                next_up.as_ref().map(|p| p.name.as_str()),
            )),
            CoreEvent::Skipped { name, next_up, .. } => Some(format::skipped(
                name,
                next_up.as_ref().map(|p| p.name.as_str()),
            )),
            CoreEvent::RoundAdvanced { round } => Some(format::round_advanced(*round)),
            CoreEvent::QueueCompleted => Some(format::queue_completed()),
            _ => None,
        }
    }

    /// Announce a core event. Returns true if a message was posted.
    pub fn handle_event(&mut self, event: &CoreEvent) -> bool {
        match Self::message_for(event) {
            Some(message) => self.announce(&message),
            None => false,
        }
    }

    /// Post a message unless chat is disabled or the window is still closed.
    /// Returns true if the sink accepted it.
    pub fn announce(&mut self, message: &str) -> bool {
        if !self.enabled {
            return false;
        }

        if !self.limiter.check(&(), self.clock.now()) {
            debug!(text = message, "Chat message dropped by rate limit");
            return false;
        }

        match self.sink.post(message) {
            Ok(()) => {
                info!(text = message, "Posted chat message");
                self.posted += 1;
                self.last_message = Some(message.to_string());
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to post chat message");
                // Nothing went out, so the next message may try right away
                self.limiter.remove(&());
                false
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Flip verbose mode, returning the new value
    pub fn toggle_verbose(&mut self) -> bool {
        self.verbose = !self.verbose;
        info!(verbose = self.verbose, "Chat verbose mode toggled");
        self.verbose
    }

    pub fn posted_count(&self) -> u64 {
        self.posted
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatError;
    use speakq_api::ParticipantRef;
    use speakq_util::{ManualClock, ParticipantId};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingSink {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl ChatSink for RecordingSink {
        fn post(&self, message: &str) -> ChatResult<()> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    /// Fails while the flag is set, records otherwise
    #[derive(Clone, Default)]
    struct FlakySink {
        down: Arc<Mutex<bool>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl ChatSink for FlakySink {
        fn post(&self, message: &str) -> ChatResult<()> {
            if *self.down.lock().unwrap() {
                return Err(ChatError::PostFailed("offline".into()));
            }
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    impl ChatSink for FailingSink {
        fn post(&self, _message: &str) -> ChatResult<()> {
            Err(ChatError::PostFailed("offline".into()))
        }
    }

    fn config(rate_limit_secs: u64) -> ChatConfig {
        ChatConfig {
            rate_limit: Duration::from_secs(rate_limit_secs),
            ..ChatConfig::default()
        }
    }

    fn ended(name: &str, secs: u64, next: Option<&str>) -> CoreEvent {
        CoreEvent::SpeakerEnded {
            participant_id: ParticipantId::new(name),
            name: name.into(),
            speaking_time: Duration::from_secs(secs),
            next_up: next.map(|n| ParticipantRef {
                id: ParticipantId::new(n),
                name: n.into(),
            }),
        }
    }

    #[test]
    fn test_announces_speaker_change() {
        let sink = RecordingSink::default();
        let clock = ManualClock::new();
        let mut announcer = Announcer::new(&config(10), Box::new(sink.clone()), Arc::new(clock));

        assert!(announcer.handle_event(&ended("John Doe", 120, Some("Jane Smith"))));
        assert_eq!(
            announcer.last_message(),
            Some("✅ John Doe finished (2:00) → Next: Jane Smith")
        );
        assert_eq!(sink.messages.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rate_limit_drops_messages_inside_window() {
        let sink = RecordingSink::default();
        let clock = ManualClock::new();
        let mut announcer =
            Announcer::new(&config(10), Box::new(sink.clone()), Arc::new(clock.clone()));

        assert!(announcer.announce("first"));
        clock.advance_secs(5);
        assert!(!announcer.announce("second"));
        clock.advance_secs(5);
        assert!(announcer.announce("third"));

        assert_eq!(*sink.messages.lock().unwrap(), vec!["first", "third"]);
        assert_eq!(announcer.posted_count(), 2);
    }

    #[test]
    fn test_zero_rate_limit_posts_everything() {
        let sink = RecordingSink::default();
        let mut announcer =
            Announcer::new(&config(0), Box::new(sink.clone()), Arc::new(ManualClock::new()));

        assert!(announcer.announce("a"));
        assert!(announcer.announce("b"));
        assert_eq!(sink.messages.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_ignores_quiet_events() {
        let sink = RecordingSink::default();
        let mut announcer =
            Announcer::new(&config(0), Box::new(sink.clone()), Arc::new(ManualClock::new()));

        assert!(!announcer.handle_event(&CoreEvent::QueueReset));
        assert!(!announcer.handle_event(&CoreEvent::SpeakerStarted {
            participant_id: ParticipantId::new("1"),
            name: "John".into(),
        }));
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_disabled_chat_posts_nothing() {
        let sink = RecordingSink::default();
        let cfg = ChatConfig {
            enabled: false,
            ..config(0)
        };
        let mut announcer = Announcer::new(&cfg, Box::new(sink.clone()), Arc::new(ManualClock::new()));

        assert!(!announcer.handle_event(&CoreEvent::QueueCompleted));
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sink_failure_is_not_retried() {
        let mut announcer =
            Announcer::new(&config(0), Box::new(FailingSink), Arc::new(ManualClock::new()));

        assert!(!announcer.handle_event(&CoreEvent::QueueCompleted));
        assert_eq!(announcer.posted_count(), 0);
        assert!(announcer.last_message().is_none());
    }

    #[test]
    fn test_failed_post_keeps_window_open() {
        let sink = FlakySink::default();
        let clock = ManualClock::new();
        let mut announcer =
            Announcer::new(&config(10), Box::new(sink.clone()), Arc::new(clock.clone()));

        *sink.down.lock().unwrap() = true;
        assert!(!announcer.announce("lost"));

        *sink.down.lock().unwrap() = false;
        clock.advance_secs(1);
        assert!(announcer.announce("delivered"));

        // The window now runs from the successful post
        clock.advance_secs(9);
        assert!(!announcer.announce("too soon"));
        clock.advance_secs(1);
        assert!(announcer.announce("later"));

        assert_eq!(*sink.messages.lock().unwrap(), vec!["delivered", "later"]);
    }

    #[test]
    fn test_toggle_verbose() {
        let mut announcer =
            Announcer::new(&config(0), Box::new(FailingSink), Arc::new(ManualClock::new()));
        assert!(!announcer.verbose());
        assert!(announcer.toggle_verbose());
        assert!(!announcer.toggle_verbose());
    }
}
