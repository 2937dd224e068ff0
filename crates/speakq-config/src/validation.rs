//! Configuration validation

use crate::schema::{RawConfig, RawParticipant};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Participant '{participant_id}': {message}")]
    ParticipantError {
        participant_id: String,
        message: String,
    },

    #[error("Duplicate participant ID: {0}")]
    DuplicateParticipantId(String),

    #[error("Service config error: {0}")]
    ServiceError(String),

    #[error("Chat config error: {0}")]
    ChatError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_ids = HashSet::new();
    for participant in &config.participants {
        if !seen_ids.insert(&participant.id) {
            errors.push(ValidationError::DuplicateParticipantId(participant.id.clone()));
        }
    }

    for participant in &config.participants {
        errors.extend(validate_participant(participant));
    }

    if config.service.tick_interval_ms == Some(0) {
        errors.push(ValidationError::ServiceError(
            "tick_interval_ms must be greater than 0".into(),
        ));
    }

    if config.service.requests_per_second == Some(0) {
        errors.push(ValidationError::ServiceError(
            "requests_per_second must be greater than 0".into(),
        ));
    }

    if let Some(prefix) = &config.chat.command_prefix {
        if prefix.trim().is_empty() {
            errors.push(ValidationError::ChatError(
                "command_prefix cannot be empty".into(),
            ));
        }
    }

    errors
}

fn validate_participant(participant: &RawParticipant) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if participant.id.trim().is_empty() {
        errors.push(ValidationError::ParticipantError {
            participant_id: participant.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if participant.name.trim().is_empty() {
        errors.push(ValidationError::ParticipantError {
            participant_id: participant.id.clone(),
            message: "name cannot be empty".into(),
        });
    }

    errors
}
