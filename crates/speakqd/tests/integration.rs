//! Integration tests for speakqd
//!
//! These tests drive the scheduler through its public surface the way the
//! daemon does, and run one full request/event round trip over a socket.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speakq_api::{
    Command, EventPayload, MeetingFormat, ParticipantStatus, QueueProgress, ResponsePayload,
    ResponseResult,
};
use speakq_chat::{ChatResult, ChatSink};
use speakq_config::{parse_config, ChatConfig};
use speakq_core::Scheduler;
use speakq_ipc::{IpcClient, IpcServer, ServerMessage};
use speakq_util::{Clock, ManualClock, ParticipantId};
use speakqd::{event_payload, handle_command, ChatBridge};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Mutex;

fn pid(s: &str) -> ParticipantId {
    ParticipantId::new(s)
}

fn scheduler() -> (Scheduler, ManualClock) {
    let clock = ManualClock::new();
    (Scheduler::new(Arc::new(clock.clone())), clock)
}

fn john_and_jane(s: &mut Scheduler) {
    s.add_participant(pid("1"), "John");
    s.add_participant(pid("2"), "Jane");
}

fn status(s: &Scheduler, id: &str) -> ParticipantStatus {
    s.participant(&pid(id)).map(|p| p.status).unwrap_or_else(|| panic!("no participant {}", id))
}

fn check_invariants(s: &Scheduler) {
    let mut positions: Vec<usize> = s.participants().iter().map(|p| p.position).collect();
    positions.sort_unstable();
    assert_eq!(positions, (0..s.participants().len()).collect::<Vec<_>>());

    let speaking: Vec<&ParticipantId> = s
        .participants()
        .iter()
        .filter(|p| p.status == ParticipantStatus::Speaking)
        .map(|p| &p.id)
        .collect();
    assert!(speaking.len() <= 1, "more than one speaker: {:?}", speaking);
    assert_eq!(speaking.first().copied(), s.current_speaker_id());

    assert!(s.auto_advance_delay() <= 30);
}

#[test]
fn test_zero_delay_hands_over_immediately() {
    let (mut s, _) = scheduler();
    john_and_jane(&mut s);
    s.set_auto_advance_delay(0);

    s.start_speaking(&pid("1"));
    s.end_turn(&pid("1"));

    assert_eq!(s.current_speaker_id(), Some(&pid("2")));
    assert_eq!(status(&s, "2"), ParticipantStatus::Speaking);
}

#[test]
fn test_round_robin_restarts_single_speaker() {
    let (mut s, _) = scheduler();
    s.set_meeting_format(MeetingFormat::RoundRobin);
    s.add_participant(pid("1"), "John");

    s.start_speaking(&pid("1"));
    s.end_turn(&pid("1"));

    assert_eq!(s.current_round(), 2);
    assert_eq!(status(&s, "1"), ParticipantStatus::Speaking);
}

#[test]
fn test_time_box_expires_without_manual_end() {
    let (mut s, clock) = scheduler();
    s.set_meeting_format(MeetingFormat::TimeBox);
    s.set_time_limit(30);
    john_and_jane(&mut s);

    s.start_speaking(&pid("1"));
    clock.advance(Duration::from_secs(30));
    s.tick();

    assert_eq!(status(&s, "1"), ParticipantStatus::Completed);
    assert_eq!(status(&s, "2"), ParticipantStatus::Speaking);
}

#[test]
fn test_manual_start_cancels_pending_advance() {
    let (mut s, clock) = scheduler();
    s.set_auto_advance_delay(3);
    john_and_jane(&mut s);
    s.add_participant(pid("3"), "Bob");

    s.start_speaking(&pid("1"));
    s.end_turn(&pid("1"));
    assert_eq!(s.auto_advance_countdown(), 3);

    clock.advance(Duration::from_secs(2));
    s.tick();
    s.start_speaking(&pid("3"));

    for _ in 0..10 {
        clock.advance(Duration::from_secs(1));
        s.tick();
    }

    assert_eq!(s.current_speaker_id(), Some(&pid("3")));
    assert_eq!(status(&s, "2"), ParticipantStatus::Waiting);
}

#[test]
fn test_delay_always_clamped() {
    let (mut s, _) = scheduler();
    s.set_auto_advance_delay(-5);
    assert_eq!(s.auto_advance_delay(), 0);
    s.set_auto_advance_delay(100);
    assert_eq!(s.auto_advance_delay(), 30);
}

#[test]
fn test_progress_after_one_completed() {
    let (mut s, _) = scheduler();
    s.set_auto_advance(false);
    john_and_jane(&mut s);
    s.add_participant(pid("3"), "Bob");

    s.start_speaking(&pid("1"));
    s.end_turn(&pid("1"));

    assert_eq!(
        s.queue_progress(),
        QueueProgress {
            total: 3,
            completed: 1,
            remaining: 2
        }
    );
}

#[test]
fn test_shuffle_never_moves_settled_participants() {
    let (mut s, _) = scheduler();
    s.set_auto_advance(false);
    for i in 0..8 {
        s.add_participant(pid(&i.to_string()), format!("P{}", i));
    }
    s.start_speaking(&pid("5"));
    s.end_turn(&pid("5"));
    s.start_speaking(&pid("2"));
    s.end_turn(&pid("2"));
    s.start_speaking(&pid("7"));

    let settled_before: Vec<ParticipantId> = settled_in_order(&s);
    let ids_before: HashSet<ParticipantId> = s.participants().iter().map(|p| p.id.clone()).collect();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        s.shuffle_queue_with(&mut rng);
        check_invariants(&s);
        assert_eq!(settled_in_order(&s), settled_before);
    }

    let ids_after: HashSet<ParticipantId> = s.participants().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids_before, ids_after);
}

fn settled_in_order(s: &Scheduler) -> Vec<ParticipantId> {
    let mut settled: Vec<_> = s
        .participants()
        .iter()
        .filter(|p| matches!(p.status, ParticipantStatus::Completed | ParticipantStatus::Speaking))
        .collect();
    settled.sort_by_key(|p| p.position);
    settled.into_iter().map(|p| p.id.clone()).collect()
}

#[test]
fn test_invariants_hold_under_random_commands() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let (mut s, clock) = scheduler();
        let mut added = 0;

        for _ in 0..200 {
            let target = pid(&rng.random_range(0..8).to_string());
            match rng.random_range(0..16) {
                0 | 1 => {
                    s.add_participant(pid(&added.to_string()), format!("P{}", added));
                    added += 1;
                }
                2 => s.start_speaking(&target),
                3 => s.end_turn(&target),
                4 => s.end_current_turn(),
                5 => s.skip_participant(&target),
                6 => s.pause_participant(&target),
                7 => s.unpause_participant(&target),
                8 => {
                    let ids: Vec<_> = (0..4).map(|_| pid(&rng.random_range(0..8).to_string())).collect();
                    s.reorder_participants(&ids);
                }
                9 => s.shuffle_queue_with(&mut rng),
                10 => s.complete_round(),
                11 => {
                    let format = match rng.random_range(0..3) {
                        0 => MeetingFormat::Standard,
                        1 => MeetingFormat::RoundRobin,
                        _ => MeetingFormat::TimeBox,
                    };
                    s.set_meeting_format(format);
                }
                12 => s.set_auto_advance_delay(rng.random_range(-10..50)),
                13 => s.set_time_limit(rng.random_range(0..20)),
                14 => s.start_next(),
                _ => {
                    clock.advance(Duration::from_millis(rng.random_range(0..5000)));
                    s.tick();
                }
            }
            check_invariants(&s);
        }
    }
}

#[test]
fn test_config_seeds_scheduler() {
    let config = parse_config(
        r#"
        config_version = 1

        [meeting]
        format = "time_box"
        time_limit_seconds = 60
        auto_advance_delay_seconds = 45

        [[participants]]
        id = "u-1"
        name = "Alice"

        [[participants]]
        id = "u-2"
        name = "Bob"
        "#,
    )
    .unwrap();

    let clock = ManualClock::new();
    let mut s = Scheduler::from_config(&config, Arc::new(clock.clone()));

    assert_eq!(s.participants().len(), 2);
    assert_eq!(s.auto_advance_delay(), 30);

    s.start_queue();
    clock.advance(Duration::from_secs(60));
    s.tick();
    assert_eq!(s.current_speaker_id(), Some(&pid("u-2")));
}

#[test]
fn test_core_events_map_to_protocol() {
    let (mut s, _) = scheduler();
    let mut rx = s.subscribe();
    s.set_auto_advance_delay(0);
    john_and_jane(&mut s);
    s.start_speaking(&pid("1"));
    s.end_turn(&pid("1"));

    let mut payloads = Vec::new();
    while let Ok(event) = rx.try_recv() {
        payloads.push(event_payload(&event));
    }

    assert!(payloads.iter().any(|p| matches!(
        p,
        EventPayload::SpeakerEnded { next_up: Some(next), .. } if next.name == "Jane"
    )));
    assert!(matches!(
        payloads.last(),
        Some(EventPayload::SpeakerStarted { name, .. }) if name == "Jane"
    ));
}

#[derive(Clone, Default)]
struct RecordingSink {
    messages: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ChatSink for RecordingSink {
    fn post(&self, message: &str) -> ChatResult<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[test]
fn test_announcements_follow_the_queue() {
    let clock = ManualClock::new();
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let mut s = Scheduler::new(shared.clone());
    let mut rx = s.subscribe();
    let sink = RecordingSink::default();
    let config = ChatConfig {
        rate_limit: Duration::ZERO,
        ..ChatConfig::default()
    };
    let mut chat = ChatBridge::new(&config, Box::new(sink.clone()), shared);

    s.set_auto_advance(false);
    john_and_jane(&mut s);
    s.start_queue();
    clock.advance(Duration::from_secs(120));
    s.end_current_turn();
    s.skip_participant(&pid("2"));

    while let Ok(event) = rx.try_recv() {
        chat.on_event(&event);
    }

    let messages = sink.messages.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec![
            "🎤 Speaker Queue Started:\n1. John\n2. Jane".to_string(),
            "✅ John finished (2:00) → Next: Jane".to_string(),
            "⏭️ Jane skipped".to_string(),
            "🎉 All speakers have finished!".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_socket_round_trip() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("speakqd.sock");

    let mut server = IpcServer::new(&socket_path);
    server.start().await.unwrap();
    let mut messages = server.take_message_receiver().await.unwrap();
    let server = Arc::new(server);

    let accept = server.clone();
    tokio::spawn(async move {
        let _ = accept.run().await;
    });

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let scheduler = Arc::new(Mutex::new(Scheduler::new(clock.clone())));
    let mut core_events = scheduler.lock().await.subscribe();
    let mut chat = ChatBridge::new(&ChatConfig::default(), Box::new(RecordingSink::default()), clock);

    let responder = server.clone();
    let engine = scheduler.clone();
    tokio::spawn(async move {
        while let Some(msg) = messages.recv().await {
            let ServerMessage::Request { client_id, request } = msg else {
                continue;
            };
            let mut scheduler = engine.lock().await;
            let response =
                handle_command(&mut scheduler, &mut chat, &client_id, request.request_id, request.command);
            let _ = responder.send_response(&client_id, response).await;
            while let Ok(event) = core_events.try_recv() {
                responder.broadcast_event(speakq_api::Event::new(event_payload(&event)));
            }
        }
    });

    let watcher = IpcClient::connect(&socket_path).await.unwrap();
    let mut events = watcher.subscribe().await.unwrap();

    let mut client = IpcClient::connect(&socket_path).await.unwrap();
    client
        .send(Command::AddParticipant {
            id: pid("1"),
            name: "John".into(),
        })
        .await
        .unwrap();
    let response = client.send(Command::StartSpeaking { id: pid("1") }).await.unwrap();

    match response.result {
        ResponseResult::Ok(ResponsePayload::State(snapshot)) => {
            assert_eq!(snapshot.current_speaker, Some(pid("1")));
        }
        other => panic!("Expected state, got {:?}", other),
    }

    let first = events.next().await.unwrap();
    assert!(matches!(first.payload, EventPayload::ParticipantAdded { position: 0, .. }));
    let second = events.next().await.unwrap();
    assert!(matches!(second.payload, EventPayload::SpeakerStarted { .. }));

    // Engine state matches what the client saw
    let engine = scheduler.lock().await;
    assert_eq!(engine.current_speaker_id(), Some(&pid("1")));
}
