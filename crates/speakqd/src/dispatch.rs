//! Protocol command dispatch

use speakq_api::{Command, HealthStatus, Response, ResponsePayload};
use speakq_core::Scheduler;
use speakq_util::ClientId;
use tracing::debug;

use crate::ChatBridge;

/// Run one protocol command against the scheduler.
///
/// Queue commands always succeed; commands the scheduler ignores still get
/// the current state back.
pub fn handle_command(
    scheduler: &mut Scheduler,
    chat: &mut ChatBridge,
    client_id: &ClientId,
    request_id: u64,
    command: Command,
) -> Response {
    debug!(client_id = %client_id, request_id, command = ?command, "Handling command");

    match command {
        Command::GetState => state(request_id, scheduler),

        Command::AddParticipant { id, name } => {
            scheduler.add_participant(id, name);
            state(request_id, scheduler)
        }

        Command::StartQueue => {
            scheduler.start_queue();
            state(request_id, scheduler)
        }

        Command::StartSpeaking { id } => {
            scheduler.start_speaking(&id);
            state(request_id, scheduler)
        }

        Command::StartNext => {
            scheduler.start_next();
            state(request_id, scheduler)
        }

        Command::EndTurn { id } => {
            scheduler.end_turn(&id);
            state(request_id, scheduler)
        }

        Command::EndCurrentTurn => {
            scheduler.end_current_turn();
            state(request_id, scheduler)
        }

        Command::Skip { id } => {
            scheduler.skip_participant(&id);
            state(request_id, scheduler)
        }

        Command::Pause { id } => {
            scheduler.pause_participant(&id);
            state(request_id, scheduler)
        }

        Command::Unpause { id } => {
            scheduler.unpause_participant(&id);
            state(request_id, scheduler)
        }

        Command::Reorder { ids } => {
            scheduler.reorder_participants(&ids);
            state(request_id, scheduler)
        }

        Command::Shuffle => {
            scheduler.shuffle_queue();
            state(request_id, scheduler)
        }

        Command::Reset => {
            scheduler.reset_queue();
            state(request_id, scheduler)
        }

        Command::CompleteRound => {
            scheduler.complete_round();
            state(request_id, scheduler)
        }

        Command::SetFormat { format } => {
            scheduler.set_meeting_format(format);
            state(request_id, scheduler)
        }

        Command::SetTimeLimit { seconds } => {
            scheduler.set_time_limit(seconds);
            state(request_id, scheduler)
        }

        Command::SetAutoAdvance { enabled } => {
            scheduler.set_auto_advance(enabled);
            state(request_id, scheduler)
        }

        Command::SetAutoAdvanceDelay { seconds } => {
            scheduler.set_auto_advance_delay(seconds);
            state(request_id, scheduler)
        }

        Command::GetNextSpeaker => Response::success(
            request_id,
            ResponsePayload::NextSpeaker {
                participant: scheduler.next_speaker().map(|p| p.to_view()),
            },
        ),

        Command::GetProgress => {
            Response::success(request_id, ResponsePayload::Progress(scheduler.queue_progress()))
        }

        Command::GetSettings => {
            Response::success(request_id, ResponsePayload::Settings(scheduler.meeting_settings()))
        }

        Command::ChatMessage { text } => {
            let reply = chat.handle_message(scheduler, &text);
            Response::success(request_id, ResponsePayload::ChatHandled { reply })
        }

        Command::SubscribeEvents => Response::success(
            request_id,
            ResponsePayload::Subscribed {
                client_id: client_id.clone(),
            },
        ),

        Command::UnsubscribeEvents => Response::success(request_id, ResponsePayload::Unsubscribed),

        Command::GetHealth => Response::success(
            request_id,
            ResponsePayload::Health(HealthStatus {
                live: true,
                ready: true,
                participant_count: scheduler.participants().len(),
            }),
        ),

        Command::Ping => Response::success(request_id, ResponsePayload::Pong),
    }
}

fn state(request_id: u64, scheduler: &Scheduler) -> Response {
    Response::success(request_id, ResponsePayload::State(scheduler.snapshot()))
}
