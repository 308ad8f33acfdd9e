//! Boss encounter transitions: phase-2 registration and periodic recycling.
use chrono::{DateTime, Utc};

use crate::board::{Board, SlotKey};
use crate::catalog::MissionCatalog;
use crate::constants::{LOG_BOSS_PHASE2_SUBMITTED, LOG_BOSS_RESET, PROPOSALS_PER_SLOT};
use crate::error::BoardError;
use crate::proposals;

/// Submit phase-2 proof for an exposed boss.
///
/// Requires the mission id to match the active hunt selection and the shield
/// to be down. Re-submitting after a proof has been recorded is an
/// idempotent no-op.
pub fn register_phase2(
    board: &mut Board,
    mission_id: &str,
    proof: &str,
    now: DateTime<Utc>,
) -> Result<(), BoardError> {
    let matches = board
        .hunt_selection()
        .is_some_and(|sel| sel.mission.id == mission_id);
    if !matches {
        return Err(BoardError::MissionMismatch {
            user_id: board.user_id.clone(),
            slot: SlotKey::Hunt,
            mission_id: mission_id.to_string(),
        });
    }
    if !board.boss.phase2.ready {
        return Err(BoardError::BossNotReady {
            user_id: board.user_id.clone(),
            current: board.boss.shield.current,
            max: board.boss.shield.max,
        });
    }
    if board.boss.phase2.proof.is_some() {
        return Ok(());
    }
    board.boss.phase2.proof = Some(proof.to_string());
    board.boss.phase2.submitted_at = Some(now);
    board.push_log(LOG_BOSS_PHASE2_SUBMITTED);
    log::debug!("user {}: boss phase-2 proof submitted", board.user_id);
    Ok(())
}

/// Fortnightly cron entry point: recycle a defeated encounter.
///
/// Only a boss whose shield is down AND whose phase-2 proof has been
/// submitted is recycled; anything else is left untouched. Recycling
/// restores the shield, clears the link, and regenerates hunt proposals.
pub fn run_boss_maintenance(
    board: &mut Board,
    catalog: &MissionCatalog,
    now: DateTime<Utc>,
    engine_seed: u64,
) {
    let defeated = board.boss.shield.current == 0 && board.boss.phase2.proof.is_some();
    if !defeated {
        return;
    }
    board.boss.reset(now);
    proposals::generate_for_slot(board, catalog, SlotKey::Hunt, PROPOSALS_PER_SLOT, engine_seed);
    board.push_log(LOG_BOSS_RESET);
    log::debug!("user {}: boss encounter recycled", board.user_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BossPhase;
    use crate::selection;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn board_with_hunt_selection() -> (Board, String) {
        let catalog = MissionCatalog::load_from_static();
        let mut board = Board::new("user-1", t0());
        proposals::generate_for_slot(&mut board, &catalog, SlotKey::Hunt, 4, 42);
        let proposal_id = board.slot(SlotKey::Hunt).proposals[0].id.clone();
        selection::select_mission(&mut board, SlotKey::Hunt, &proposal_id, t0()).unwrap();
        let mission_id = board.hunt_selection().unwrap().mission.id.clone();
        (board, mission_id)
    }

    #[test]
    fn phase2_requires_matching_mission() {
        let (mut board, _) = board_with_hunt_selection();
        let err = register_phase2(&mut board, "other", "proof", t0()).unwrap_err();
        assert!(matches!(err, BoardError::MissionMismatch { .. }));
    }

    #[test]
    fn phase2_requires_depleted_shield() {
        let (mut board, mission_id) = board_with_hunt_selection();
        let err = register_phase2(&mut board, &mission_id, "proof", t0()).unwrap_err();
        assert!(matches!(
            err,
            BoardError::BossNotReady { current, .. } if current > 0
        ));
    }

    #[test]
    fn phase2_submission_is_idempotent() {
        let (mut board, mission_id) = board_with_hunt_selection();
        board.boss.shield.current = 0;
        board.boss.phase = BossPhase::Exposed;
        board.boss.phase2.ready = true;

        register_phase2(&mut board, &mission_id, "first", t0()).unwrap();
        let submitted_at = board.boss.phase2.submitted_at;
        assert_eq!(board.boss.phase2.proof.as_deref(), Some("first"));

        register_phase2(&mut board, &mission_id, "second", t0()).unwrap();
        assert_eq!(
            board.boss.phase2.proof.as_deref(),
            Some("first"),
            "proof is never re-stamped"
        );
        assert_eq!(board.boss.phase2.submitted_at, submitted_at);
    }

    #[test]
    fn maintenance_ignores_undefeated_boss() {
        let catalog = MissionCatalog::load_from_static();
        let (mut board, _) = board_with_hunt_selection();

        // Shield up, no proof.
        let before = board.clone();
        run_boss_maintenance(&mut board, &catalog, t0(), 42);
        assert_eq!(board, before);

        // Shield down but no proof yet.
        board.boss.shield.current = 0;
        board.boss.phase = BossPhase::Exposed;
        board.boss.phase2.ready = true;
        let before = board.clone();
        run_boss_maintenance(&mut board, &catalog, t0(), 42);
        assert_eq!(board, before);
    }

    #[test]
    fn maintenance_recycles_defeated_boss() {
        let catalog = MissionCatalog::load_from_static();
        let (mut board, mission_id) = board_with_hunt_selection();
        board.boss.shield.current = 0;
        board.boss.phase = BossPhase::Exposed;
        board.boss.phase2.ready = true;
        board.boss.linked_daily_task_id = Some("task-1".to_string());
        register_phase2(&mut board, &mission_id, "proof", t0()).unwrap();

        let old_proposals = board.slot(SlotKey::Hunt).proposals.clone();
        run_boss_maintenance(&mut board, &catalog, t0(), 42);

        assert_eq!(board.boss.phase, BossPhase::Shielded);
        assert_eq!(board.boss.shield.current, board.boss.shield.max);
        assert!(board.boss.linked_daily_task_id.is_none());
        assert!(board.boss.phase2.proof.is_none());
        assert!(!board.boss.phase2.ready);
        assert_ne!(
            board.slot(SlotKey::Hunt).proposals, old_proposals,
            "hunt proposals are regenerated"
        );
    }
}
