//! Error taxonomy for board operations.
//!
//! Every variant is a caller-correctable validation or state error; none is
//! process-fatal. Idempotent repeats (already claimed, already applied,
//! already submitted) are not errors and return the current state instead.
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::board::{SelectionStatus, SlotKey};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("user {user_id}: mission {mission_id} is not among the {slot} proposals")]
    MissionNotFound {
        user_id: String,
        slot: SlotKey,
        mission_id: String,
    },
    #[error("user {user_id}: {slot} reroll exhausted until {next_reset_at}")]
    RerollExhausted {
        user_id: String,
        slot: SlotKey,
        next_reset_at: DateTime<Utc>,
    },
    #[error("user {user_id}: mission {mission_id} does not match the active {slot} selection")]
    MissionMismatch {
        user_id: String,
        slot: SlotKey,
        mission_id: String,
    },
    #[error("user {user_id}: boss shield still holds ({current}/{max})")]
    BossNotReady {
        user_id: String,
        current: u32,
        max: u32,
    },
    #[error("user {user_id}: no committed selection carries mission {mission_id}")]
    MissionNotActive { user_id: String, mission_id: String },
    #[error("user {user_id}: mission {mission_id} is not ready to claim (status {status})")]
    ClaimNotReady {
        user_id: String,
        mission_id: String,
        status: SelectionStatus,
    },
    #[error("user {user_id}: board storage failed")]
    Storage {
        user_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BoardError {
    /// User the failing operation was addressed to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::MissionNotFound { user_id, .. }
            | Self::RerollExhausted { user_id, .. }
            | Self::MissionMismatch { user_id, .. }
            | Self::BossNotReady { user_id, .. }
            | Self::MissionNotActive { user_id, .. }
            | Self::ClaimNotReady { user_id, .. }
            | Self::Storage { user_id, .. } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_caller_context() {
        let err = BoardError::MissionNotFound {
            user_id: "u1".to_string(),
            slot: SlotKey::Hunt,
            mission_id: "m1".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("u1"));
        assert!(rendered.contains("hunt"));
        assert!(rendered.contains("m1"));
        assert_eq!(err.user_id(), "u1");
    }
}
