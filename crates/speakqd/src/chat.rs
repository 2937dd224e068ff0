//! Chat commands and announcements

use speakq_chat::{queue_status, Announcer, ChatCommand, ChatSink};
use speakq_config::ChatConfig;
use speakq_core::{CoreEvent, Scheduler};
use speakq_util::{Clock, ParticipantId};
use std::sync::Arc;
use tracing::{debug, info};

/// Connects the scheduler to the meeting chat
pub struct ChatBridge {
    announcer: Announcer,
    prefix: String,
}

impl ChatBridge {
    pub fn new(config: &ChatConfig, sink: Box<dyn ChatSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            announcer: Announcer::new(config, sink, clock),
            prefix: config.command_prefix.clone(),
        }
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    /// Announce an engine event in chat
    pub fn on_event(&mut self, event: &CoreEvent) {
        self.announcer.handle_event(event);
    }

    /// Run a chat line against the scheduler.
    ///
    /// Returns the reply for the sender, if any. Lines that are not commands
    /// are ignored.
    pub fn handle_message(&mut self, scheduler: &mut Scheduler, text: &str) -> Option<String> {
        let command = ChatCommand::parse(&self.prefix, text)?;
        info!(command = ?command, "Chat command");

        match command {
            ChatCommand::Next => {
                if scheduler.current_speaker_id().is_some() {
                    scheduler.end_current_turn();
                } else {
                    scheduler.start_next();
                }
                None
            }

            ChatCommand::Skip { target: None } => {
                match scheduler.current_speaker_id().cloned() {
                    Some(id) => {
                        scheduler.skip_participant(&id);
                        None
                    }
                    None => Some("Nobody is speaking".to_string()),
                }
            }

            ChatCommand::Skip {
                target: Some(target),
            } => match find_participant(scheduler, &target) {
                Some(id) => {
                    scheduler.skip_participant(&id);
                    None
                }
                None => {
                    debug!(wanted = %target, "Skip target not found");
                    Some(format!("No participant named {}", target))
                }
            },

            ChatCommand::Status => {
                let status = queue_status(
                    &scheduler.snapshot(),
                    self.announcer.verbose(),
                    speakq_util::now(),
                );
                self.announcer.announce(&status);
                Some(status)
            }

            ChatCommand::Shuffle => {
                scheduler.shuffle_queue();
                None
            }

            ChatCommand::Reset => {
                scheduler.reset_queue();
                None
            }

            ChatCommand::Verbose => {
                let verbose = self.announcer.toggle_verbose();
                Some(format!("Verbose mode {}", if verbose { "on" } else { "off" }))
            }

            ChatCommand::Unknown(name) => Some(format!("Unknown command: {}{}", self.prefix, name)),
        }
    }
}

/// Match by id first, then by display name ignoring case
fn find_participant(scheduler: &Scheduler, target: &str) -> Option<ParticipantId> {
    let by_id = ParticipantId::new(target);
    if scheduler.participant(&by_id).is_some() {
        return Some(by_id);
    }

    scheduler
        .participants()
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(target))
        .map(|p| p.id.clone())
}
