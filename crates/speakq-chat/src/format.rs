//! Chat message text

use chrono::{DateTime, Local};
use speakq_api::{ParticipantStatus, ParticipantView, QueueSnapshot};
use speakq_util::format_mm_ss;
use std::time::Duration;

/// Format a speaking time as `m:ss`
pub fn format_duration(duration: Duration) -> String {
    format_mm_ss(duration.as_secs())
}

fn numbered_list(participants: &[&ParticipantView]) -> String {
    participants
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let suffix = if p.status == ParticipantStatus::Paused {
                " (paused)"
            } else {
                ""
            };
            format!("{}. {}{}", i + 1, p.name, suffix)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn queue_started(upcoming: &[ParticipantView]) -> String {
    let lined_up: Vec<&ParticipantView> = upcoming.iter().filter(|p| p.status.is_queued()).collect();
    if lined_up.is_empty() {
        return "🎤 Speaker Queue Started".to_string();
    }
    format!("🎤 Speaker Queue Started:\n{}", numbered_list(&lined_up))
}

pub fn speaker_change(name: &str, speaking_time: Duration, next: Option<&str>) -> String {
    let time = format_duration(speaking_time);
    match next {
        Some(next) => format!("✅ {} finished ({}) → Next: {}", name, time, next),
        None => format!("✅ {} finished ({})", name, time),
    }
}

pub fn skipped(name: &str, next: Option<&str>) -> String {
    match next {
        Some(next) => format!("⏭️ {} skipped → Next: {}", name, next),
        None => format!("⏭️ {} skipped", name),
    }
}

pub fn round_advanced(round: u32) -> String {
    format!("🔁 Round {} started", round)
}

pub fn queue_completed() -> String {
    "🎉 All speakers have finished!".to_string()
}

/// Current speaker, who is lined up, and in verbose mode who is done.
/// `now` is used to show how long the current speaker has been talking.
pub fn queue_status(snapshot: &QueueSnapshot, verbose: bool, now: DateTime<Local>) -> String {
    let mut lines = Vec::new();

    let speaking = snapshot
        .participants
        .iter()
        .find(|p| p.status == ParticipantStatus::Speaking);
    if let Some(speaker) = speaking {
        let elapsed = speaker
            .turn_started_at
            .map(|started| (now - started).num_seconds().max(0) as u64)
            .unwrap_or(0);
        lines.push(format!(
            "🎤 Speaking: {} ({})",
            speaker.name,
            format_mm_ss(elapsed)
        ));
    }

    let waiting: Vec<&ParticipantView> = snapshot
        .participants
        .iter()
        .filter(|p| p.status.is_queued())
        .collect();
    if !waiting.is_empty() {
        lines.push("📋 Up Next:".to_string());
        lines.push(numbered_list(&waiting));
    }

    if verbose {
        let completed: Vec<&str> = snapshot
            .participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Completed)
            .map(|p| p.name.as_str())
            .collect();
        if !completed.is_empty() {
            lines.push(format!("✅ Completed: {}", completed.join(", ")));
        }
    }

    if lines.is_empty() {
        return "📋 The queue is empty".to_string();
    }
    lines.join("\n")
}
