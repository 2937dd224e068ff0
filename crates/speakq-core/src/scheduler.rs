//! The turn scheduler
//!
//! Single-writer owner of the roster, the current speaker and the active
//! format settings. Every command that names an unknown participant, or a
//! participant in an incompatible state, is a silent no-op so the scheduler
//! stays live for the whole session no matter what callers send.

use rand::seq::SliceRandom;
use rand::Rng;
use speakq_api::{
    clamp_auto_advance_delay, MeetingFormat, MeetingSettings, ParticipantStatus, QueueProgress,
    QueueSnapshot, API_VERSION,
};
use speakq_config::QueueConfig;
use speakq_util::{Clock, MonotonicInstant, ParticipantId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    next_waiting, on_turn_ended, CoreEvent, DeferredAction, DeferredActions, EventEmitter,
    FormatSettings, NextAction, Participant, PendingAction, TIME_WARNING_SECONDS,
};

/// The turn-scheduling engine
#[derive(Debug)]
pub struct Scheduler {
    participants: Vec<Participant>,
    current_speaker: Option<ParticipantId>,
    settings: FormatSettings,
    current_round: u32,
    deferred: DeferredActions,
    /// Whether the current turn already got its time warning
    warning_issued: bool,
    clock: Arc<dyn Clock>,
    emitter: EventEmitter,
}

impl Scheduler {
    /// Create an empty scheduler with default settings
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(clock, FormatSettings::default())
    }

    pub fn with_settings(clock: Arc<dyn Clock>, settings: FormatSettings) -> Self {
        let settings = FormatSettings {
            auto_advance_delay_seconds: clamp_auto_advance_delay(
                settings.auto_advance_delay_seconds as i64,
            ),
            ..settings
        };

        info!(
            format = %settings.format,
            time_limit_secs = settings.time_limit_seconds,
            auto_advance = settings.auto_advance_enabled,
            delay_secs = settings.auto_advance_delay_seconds,
            "Scheduler initialized"
        );

        Self {
            participants: Vec::new(),
            current_speaker: None,
            settings,
            current_round: 1,
            deferred: DeferredActions::new(),
            warning_issued: false,
            clock,
            emitter: EventEmitter::new(),
        }
    }

    /// Create a scheduler with the configured meeting defaults and roster
    pub fn from_config(config: &QueueConfig, clock: Arc<dyn Clock>) -> Self {
        let mut scheduler = Self::with_settings(clock, FormatSettings::from(&config.meeting));
        for seed in &config.participants {
            scheduler.add_participant(seed.id.clone(), seed.name.clone());
        }
        scheduler
    }

    /// Subscribe to transition events
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.emitter.subscribe()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    // Commands

    /// Append a participant at the end of the queue
    pub fn add_participant(&mut self, id: ParticipantId, name: impl Into<String>) {
        if self.index_of(&id).is_some() {
            debug!(participant_id = %id, "Participant already in roster, ignoring add");
            return;
        }

        let position = self.participants.len();
        let participant = Participant::new(id, name, position);

        info!(participant_id = %participant.id, position, "Participant added");

        self.emitter.emit(CoreEvent::ParticipantAdded {
            participant_id: participant.id.clone(),
            name: participant.name.clone(),
            position,
        });
        self.participants.push(participant);
    }

    /// Announce who is lined up and start the first waiting participant
    pub fn start_queue(&mut self) {
        let Some(next) = self.next_speaker().map(|p| p.id.clone()) else {
            debug!("Nobody waiting, queue not started");
            return;
        };

        let mut upcoming: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| p.status.is_queued())
            .collect();
        upcoming.sort_by_key(|p| p.position);
        let upcoming = upcoming.into_iter().map(Participant::to_view).collect();

        info!(first = %next, "Queue started");
        self.emitter.emit(CoreEvent::QueueStarted { upcoming });

        self.start_speaking(&next);
    }

    /// Give the floor to `id`. Cancels any pending deferred action first, and
    /// closes the turn of whoever else is speaking.
    pub fn start_speaking(&mut self, id: &ParticipantId) {
        let Some(idx) = self.index_of(id) else {
            debug!(participant_id = %id, "Unknown participant, ignoring start");
            return;
        };
        if self.current_speaker.as_ref() == Some(id) {
            debug!(participant_id = %id, "Already speaking");
            return;
        }

        let now = self.clock.now();
        self.deferred.cancel();

        if let Some(current_idx) = self.current_speaker_index() {
            let next_up = Some(self.participants[idx].to_ref());
            self.close_turn(current_idx, now, next_up);
        }

        self.begin_turn(idx, now);
    }

    /// Start whoever is next in line right away
    pub fn start_next(&mut self) {
        match self.next_speaker().map(|p| p.id.clone()) {
            Some(next) => self.start_speaking(&next),
            None => debug!("Nobody waiting"),
        }
    }

    /// End `id`'s turn and let the format policy pick what follows
    pub fn end_turn(&mut self, id: &ParticipantId) {
        let Some(idx) = self.index_of(id) else {
            debug!(participant_id = %id, "Unknown participant, ignoring end of turn");
            return;
        };
        if !self.participants[idx].is_speaking() {
            debug!(participant_id = %id, status = %self.participants[idx].status, "Not speaking, ignoring end of turn");
            return;
        }

        let was_complete = self.is_queue_complete();
        let now = self.clock.now();
        self.deferred.cancel();
        self.end_turn_at(idx, now);
        self.announce_completion(was_complete);
    }

    /// End whoever is currently speaking
    pub fn end_current_turn(&mut self) {
        match self.current_speaker.clone() {
            Some(id) => self.end_turn(&id),
            None => debug!("Nobody speaking"),
        }
    }

    /// Mark a participant as skipped. Does not start anyone else.
    pub fn skip_participant(&mut self, id: &ParticipantId) {
        let Some(idx) = self.index_of(id) else {
            debug!(participant_id = %id, "Unknown participant, ignoring skip");
            return;
        };

        let was_complete = self.is_queue_complete();

        match self.participants[idx].status {
            ParticipantStatus::Completed | ParticipantStatus::Skipped => {
                debug!(participant_id = %id, status = %self.participants[idx].status, "Already done, ignoring skip");
                return;
            }
            ParticipantStatus::Speaking => {
                self.deferred.cancel();
                self.participants[idx].abandon_turn();
                self.current_speaker = None;
            }
            ParticipantStatus::Waiting | ParticipantStatus::Paused => {}
        }

        self.participants[idx].status = ParticipantStatus::Skipped;

        let next_up = self.next_speaker().map(Participant::to_ref);
        let skipped = &self.participants[idx];

        info!(participant_id = %skipped.id, "Participant skipped");
        self.emitter.emit(CoreEvent::Skipped {
            participant_id: skipped.id.clone(),
            name: skipped.name.clone(),
            next_up,
        });

        self.announce_completion(was_complete);
    }

    pub fn pause_participant(&mut self, id: &ParticipantId) {
        self.toggle_pause(id, ParticipantStatus::Waiting, ParticipantStatus::Paused);
    }

    pub fn unpause_participant(&mut self, id: &ParticipantId) {
        self.toggle_pause(id, ParticipantStatus::Paused, ParticipantStatus::Waiting);
    }

    fn toggle_pause(&mut self, id: &ParticipantId, from: ParticipantStatus, to: ParticipantStatus) {
        let Some(participant) = self.participants.iter_mut().find(|p| &p.id == id) else {
            debug!(participant_id = %id, "Unknown participant, ignoring pause toggle");
            return;
        };
        if participant.status != from {
            debug!(participant_id = %id, status = %participant.status, wanted = %from, "Pause toggle not applicable");
            return;
        }

        participant.status = to;
        info!(participant_id = %id, status = %to, "Pause toggled");
    }

    /// Apply a final ordering. The named participants take over the positions
    /// they held between them, in the given order; everyone else stays put.
    pub fn reorder_participants(&mut self, ids_in_order: &[ParticipantId]) {
        let mut seen = HashSet::new();
        let indices: Vec<usize> = ids_in_order
            .iter()
            .filter_map(|id| self.index_of(id))
            .filter(|idx| seen.insert(*idx))
            .collect();

        let mut slots: Vec<usize> = indices
            .iter()
            .map(|&idx| self.participants[idx].position)
            .collect();
        slots.sort_unstable();

        for (&idx, slot) in indices.iter().zip(slots) {
            self.participants[idx].position = slot;
        }

        info!(count = indices.len(), "Participants reordered");
    }

    /// Shuffle everyone still waiting or paused behind those who already had
    /// their turn
    pub fn shuffle_queue(&mut self) {
        self.shuffle_queue_with(&mut rand::rng());
    }

    pub fn shuffle_queue_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut settled: Vec<usize> = (0..self.participants.len())
            .filter(|&idx| !self.participants[idx].status.is_queued())
            .collect();
        let mut queued: Vec<usize> = (0..self.participants.len())
            .filter(|&idx| self.participants[idx].status.is_queued())
            .collect();

        settled.sort_by_key(|&idx| self.participants[idx].position);
        queued.sort_by_key(|&idx| self.participants[idx].position);
        queued.shuffle(rng);

        for (position, idx) in settled.iter().chain(queued.iter()).enumerate() {
            self.participants[*idx].position = position;
        }

        info!(shuffled = queued.len(), "Queue shuffled");
    }

    /// Put everyone back to waiting. Settings and round are kept.
    pub fn reset_queue(&mut self) {
        self.deferred.cancel();
        for participant in &mut self.participants {
            participant.reset();
        }
        self.current_speaker = None;
        self.warning_issued = false;

        info!("Queue reset");
        self.emitter.emit(CoreEvent::QueueReset);
    }

    /// Switch format. Round counting restarts and any pending action is
    /// dropped. A turn in progress is held to the new format's time box,
    /// measured from when it started.
    pub fn set_meeting_format(&mut self, format: MeetingFormat) {
        self.deferred.cancel();
        self.settings.format = format;
        self.current_round = 1;

        info!(format = %format, "Meeting format changed");
        self.rearm_time_box(self.clock.now());
    }

    /// Change the time box. Applies to the turn in progress too, counted
    /// from when it started; a turn already past the new limit ends on the
    /// next tick.
    pub fn set_time_limit(&mut self, seconds: u64) {
        self.settings.time_limit_seconds = seconds;
        info!(time_limit_secs = seconds, "Time limit set");
        self.rearm_time_box(self.clock.now());
    }

    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.settings.auto_advance_enabled = enabled;
        if !enabled {
            self.deferred.cancel_if(DeferredAction::is_auto_advance);
        }
        info!(enabled, "Auto-advance toggled");
    }

    /// Set the auto-advance delay, clamped to 0..=30 seconds
    pub fn set_auto_advance_delay(&mut self, seconds: i64) {
        let clamped = clamp_auto_advance_delay(seconds);
        self.settings.auto_advance_delay_seconds = clamped;
        info!(requested = seconds, delay_secs = clamped, "Auto-advance delay set");
    }

    /// End the round early: everyone still queued counts as completed.
    /// The round counter does not move.
    pub fn complete_round(&mut self) {
        let was_complete = self.is_queue_complete();
        let now = self.clock.now();
        self.deferred.cancel();

        // Settle the queue first so the closing turn announces nobody next
        for participant in &mut self.participants {
            if participant.status.is_queued() {
                participant.status = ParticipantStatus::Completed;
            }
        }

        if let Some(idx) = self.current_speaker_index() {
            self.close_turn(idx, now, None);
        }
        self.current_speaker = None;

        info!(round = self.current_round, "Round completed manually");
        self.announce_completion(was_complete);
    }

    /// Fire the pending deferred action if it is due and issue the time
    /// warning for the current turn. Drive this periodically.
    ///
    /// Returns true if anything happened.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let was_complete = self.is_queue_complete();

        let fired = match self.deferred.take_due(now) {
            Some(action) => {
                self.fire(action, now);
                true
            }
            None => false,
        };
        let warned = self.check_time_warning(now);

        self.announce_completion(was_complete);
        fired || warned
    }

    // Queries

    /// Participants in insertion order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn current_speaker_id(&self) -> Option<&ParticipantId> {
        self.current_speaker.as_ref()
    }

    pub fn current_speaker(&self) -> Option<&Participant> {
        self.current_speaker.as_ref().and_then(|id| self.participant(id))
    }

    /// The waiting participant with the smallest position
    pub fn next_speaker(&self) -> Option<&Participant> {
        next_waiting(&self.participants)
    }

    pub fn queue_progress(&self) -> QueueProgress {
        let total = self.participants.len();
        let completed = self
            .participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Completed)
            .count();

        QueueProgress {
            total,
            completed,
            remaining: total - completed,
        }
    }

    /// True when nobody is speaking, waiting or paused
    pub fn is_queue_complete(&self) -> bool {
        self.current_speaker.is_none()
            && !self.participants.iter().any(|p| p.status.is_queued())
    }

    /// Seconds left in the current time-boxed turn
    pub fn time_remaining(&self) -> Option<u64> {
        self.time_remaining_at(self.clock.now())
    }

    pub fn is_time_warning(&self) -> bool {
        matches!(self.time_remaining(), Some(r) if r > 0 && r <= TIME_WARNING_SECONDS)
    }

    pub fn meeting_settings(&self) -> MeetingSettings {
        self.settings.to_meeting_settings(self.current_round)
    }

    pub fn format_settings(&self) -> FormatSettings {
        self.settings
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn auto_advance_delay(&self) -> u32 {
        self.settings.auto_advance_delay_seconds
    }

    /// Seconds until a pending auto-advance starts the next speaker, 0 if none
    pub fn auto_advance_countdown(&self) -> u64 {
        match self.deferred.pending() {
            Some(p) if p.action.is_auto_advance() => self.deferred.remaining_seconds(self.clock.now()),
            _ => 0,
        }
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.deferred.pending()
    }

    /// When the next deferred action becomes due
    pub fn next_deadline(&self) -> Option<MonotonicInstant> {
        self.deferred.next_due()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let mut participants: Vec<_> = self.participants.iter().map(Participant::to_view).collect();
        participants.sort_by_key(|p| p.position);

        QueueSnapshot {
            api_version: API_VERSION,
            participants,
            current_speaker: self.current_speaker.clone(),
            settings: self.meeting_settings(),
            auto_advance_delay_seconds: self.settings.auto_advance_delay_seconds,
            progress: self.queue_progress(),
            auto_advance_countdown: self.auto_advance_countdown(),
            time_remaining: self.time_remaining(),
            time_warning: self.is_time_warning(),
            queue_complete: self.is_queue_complete(),
        }
    }

    // Internals

    fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == id)
    }

    fn current_speaker_index(&self) -> Option<usize> {
        self.current_speaker.as_ref().and_then(|id| self.index_of(id))
    }

    fn time_remaining_at(&self, now: MonotonicInstant) -> Option<u64> {
        let limit = self.settings.time_box_limit()?;
        let elapsed = self.current_speaker()?.turn_elapsed(now)?;
        Some(limit.as_secs().saturating_sub(elapsed.as_secs()))
    }

    /// Start a turn. The floor must be empty.
    fn begin_turn(&mut self, idx: usize, now: MonotonicInstant) {
        let participant = &mut self.participants[idx];
        participant.begin_turn(now, speakq_util::now());

        let id = participant.id.clone();
        let name = participant.name.clone();
        self.current_speaker = Some(id.clone());
        self.warning_issued = false;

        info!(participant_id = %id, round = self.current_round, "Speaker started");
        self.emitter.emit(CoreEvent::SpeakerStarted {
            participant_id: id.clone(),
            name,
        });

        if let Some(limit) = self.settings.time_box_limit() {
            self.deferred
                .schedule(limit, DeferredAction::TimeBoxExpiry { speaker: id }, now);
        }
    }

    /// Replace the current turn's expiry with one derived from the active
    /// limit. Leaves a pending auto-advance alone.
    fn rearm_time_box(&mut self, now: MonotonicInstant) {
        let Some(speaker) = self.current_speaker.clone() else {
            return;
        };
        self.deferred.cancel_if(|action| !action.is_auto_advance());

        let Some(limit) = self.settings.time_box_limit() else {
            return;
        };
        let elapsed = self
            .current_speaker()
            .and_then(|p| p.turn_elapsed(now))
            .unwrap_or_default();
        let remaining = limit.saturating_sub(elapsed);

        if remaining.as_secs() > TIME_WARNING_SECONDS {
            self.warning_issued = false;
        }

        debug!(participant_id = %speaker, remaining_secs = remaining.as_secs(), "Time box re-armed");
        self.deferred
            .schedule(remaining, DeferredAction::TimeBoxExpiry { speaker }, now);
    }

    /// Close a turn as completed and report it. `next_up` overrides who is
    /// announced as next; `None` means "whoever is next in line".
    fn close_turn(
        &mut self,
        idx: usize,
        now: MonotonicInstant,
        next_up: Option<speakq_api::ParticipantRef>,
    ) -> Option<Duration> {
        let speaking_time = self.participants[idx].finish_turn(now)?;
        if self.current_speaker.as_ref() == Some(&self.participants[idx].id) {
            self.current_speaker = None;
        }

        let next_up = next_up.or_else(|| self.next_speaker().map(Participant::to_ref));
        let ended = &self.participants[idx];

        info!(
            participant_id = %ended.id,
            speaking_time_secs = speaking_time.as_secs(),
            "Speaker ended"
        );
        self.emitter.emit(CoreEvent::SpeakerEnded {
            participant_id: ended.id.clone(),
            name: ended.name.clone(),
            speaking_time,
            next_up,
        });

        Some(speaking_time)
    }

    /// Close the speaker's turn and apply the format policy
    fn end_turn_at(&mut self, idx: usize, now: MonotonicInstant) {
        if self.close_turn(idx, now, None).is_none() {
            return;
        }

        let just_ended = self.participants[idx].id.clone();
        match on_turn_ended(&self.settings, &self.participants, &just_ended) {
            NextAction::Idle => {
                debug!(participant_id = %just_ended, "No automatic advance");
            }
            NextAction::StartNow(next) => {
                if let Some(next_idx) = self.index_of(&next) {
                    self.begin_turn(next_idx, now);
                }
            }
            NextAction::StartAfter(delay) => {
                self.deferred.schedule(delay, DeferredAction::AutoAdvance, now);
                info!(delay_secs = delay.as_secs(), "Auto-advance scheduled");
                self.emitter.emit(CoreEvent::AutoAdvanceScheduled { delay });
            }
            NextAction::NewRound { first } => {
                self.current_round += 1;
                for participant in &mut self.participants {
                    if participant.status == ParticipantStatus::Completed {
                        participant.status = ParticipantStatus::Waiting;
                    }
                }

                info!(round = self.current_round, "Round advanced");
                self.emitter.emit(CoreEvent::RoundAdvanced {
                    round: self.current_round,
                });

                if let Some(first_idx) = self.index_of(&first) {
                    self.begin_turn(first_idx, now);
                }
            }
        }
    }

    /// Run a due deferred action against the live state
    fn fire(&mut self, action: DeferredAction, now: MonotonicInstant) {
        match action {
            DeferredAction::AutoAdvance => {
                if !self.settings.auto_advance_enabled {
                    debug!("Auto-advance disabled since scheduling, skipping");
                    return;
                }
                if self.current_speaker.is_some() {
                    debug!("Someone already speaking, skipping auto-advance");
                    return;
                }
                match self.next_speaker().map(|p| p.id.clone()) {
                    Some(next) => {
                        info!(participant_id = %next, "Auto-advancing");
                        if let Some(idx) = self.index_of(&next) {
                            self.begin_turn(idx, now);
                        }
                    }
                    None => debug!("Nobody waiting, skipping auto-advance"),
                }
            }
            DeferredAction::TimeBoxExpiry { speaker } => {
                if self.current_speaker.as_ref() != Some(&speaker) {
                    debug!(participant_id = %speaker, "Speaker changed since scheduling, skipping expiry");
                    return;
                }
                info!(participant_id = %speaker, "Time limit reached");
                if let Some(idx) = self.index_of(&speaker) {
                    self.end_turn_at(idx, now);
                }
            }
        }
    }

    fn check_time_warning(&mut self, now: MonotonicInstant) -> bool {
        if self.warning_issued {
            return false;
        }
        let Some(remaining) = self.time_remaining_at(now) else {
            return false;
        };
        if remaining == 0 || remaining > TIME_WARNING_SECONDS {
            return false;
        }
        let Some(participant_id) = self.current_speaker.clone() else {
            return false;
        };

        self.warning_issued = true;
        info!(participant_id = %participant_id, remaining_secs = remaining, "Time warning");
        self.emitter.emit(CoreEvent::TimeWarning {
            participant_id,
            remaining: Duration::from_secs(remaining),
        });
        true
    }

    fn announce_completion(&self, was_complete: bool) {
        if !was_complete && !self.participants.is_empty() && self.is_queue_complete() {
            info!("Queue completed");
            self.emitter.emit(CoreEvent::QueueCompleted);
        }
    }
}
