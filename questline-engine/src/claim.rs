//! Reward claiming for completed missions.
use chrono::{DateTime, Utc};

use crate::board::{Board, ClaimReceipt, SelectionStatus, SlotKey};
use crate::constants::LOG_MISSION_CLAIMED;
use crate::error::BoardError;

/// Transition a completed selection to claimed and stamp its reward.
///
/// Claiming an already-claimed mission is an idempotent no-op that leaves
/// the original receipt untouched. Returns the slot holding the selection.
pub fn claim_reward(
    board: &mut Board,
    mission_id: &str,
    now: DateTime<Utc>,
) -> Result<SlotKey, BoardError> {
    let Some(slot) = board.find_selected_slot(mission_id) else {
        return Err(BoardError::MissionNotActive {
            user_id: board.user_id.clone(),
            mission_id: mission_id.to_string(),
        });
    };

    let user_id = board.user_id.clone();
    let state = board.slot_mut(slot);
    let Some(selection) = state.selected.as_mut() else {
        return Err(BoardError::MissionNotActive {
            user_id,
            mission_id: mission_id.to_string(),
        });
    };

    match selection.status {
        SelectionStatus::Active => Err(BoardError::ClaimNotReady {
            user_id,
            mission_id: mission_id.to_string(),
            status: selection.status,
        }),
        SelectionStatus::Claimed => Ok(slot),
        SelectionStatus::Completed => {
            selection.status = SelectionStatus::Claimed;
            selection.claim = Some(ClaimReceipt {
                claimed_at: now,
                reward: selection.mission.template.reward.clone(),
            });
            selection.updated_at = now;
            board.push_log(LOG_MISSION_CLAIMED);
            log::debug!("user {user_id}: claimed mission reward in {slot}");
            Ok(slot)
        }
    }
}
