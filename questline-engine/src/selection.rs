//! Mission selection, reroll quota, and the weekly auto-selection sweep.
use chrono::{DateTime, Duration, Utc};

use crate::board::{
    Board, GameModeCode, Progress, Proposal, Selection, SelectionStatus, SlotKey,
};
use crate::catalog::{Difficulty, MissionCatalog};
use crate::constants::{
    LOG_MISSION_AUTO_SELECTED, LOG_MISSION_EXPIRED, LOG_MISSION_SELECTED, LOG_SLOT_REROLLED,
    MIN_PROGRESS_TARGET, PROPOSALS_PER_SLOT, REROLL_COOLDOWN_DAYS,
};
use crate::error::BoardError;
use crate::proposals;

/// Restore elapsed reroll windows on every slot.
///
/// Runs before every read and before every reroll attempt so a quota can
/// never appear permanently exhausted because a reset was missed.
pub fn refresh_rerolls(board: &mut Board, now: DateTime<Utc>) {
    for slot in SlotKey::ALL {
        board.slot_mut(slot).reroll.refresh(now);
    }
}

/// Commit a user's choice of proposal into a slot.
///
/// Replaces any existing selection unconditionally. Selecting into the hunt
/// slot resets the booster: the linked task and the idempotency ledger are
/// cleared and the multiplier is taken from the chosen mission.
pub fn select_mission(
    board: &mut Board,
    slot: SlotKey,
    proposal_id: &str,
    now: DateTime<Utc>,
) -> Result<(), BoardError> {
    let Some(index) = board
        .slot(slot)
        .proposals
        .iter()
        .position(|p| p.id == proposal_id)
    else {
        return Err(BoardError::MissionNotFound {
            user_id: board.user_id.clone(),
            slot,
            mission_id: proposal_id.to_string(),
        });
    };
    let proposal = board.slot_mut(slot).proposals.remove(index);
    commit_selection(board, slot, proposal, now, None);
    board.push_log(LOG_MISSION_SELECTED);
    log::debug!("user {}: selected mission into {slot}", board.user_id);
    Ok(())
}

/// Discard a slot's proposals for a fresh batch, spending the weekly quota.
pub fn reroll_slot(
    board: &mut Board,
    catalog: &MissionCatalog,
    slot: SlotKey,
    now: DateTime<Utc>,
    engine_seed: u64,
) -> Result<(), BoardError> {
    board.slot_mut(slot).reroll.refresh(now);
    let reroll = &board.slot(slot).reroll;
    if reroll.remaining == 0 {
        return Err(BoardError::RerollExhausted {
            user_id: board.user_id.clone(),
            slot,
            next_reset_at: reroll.next_reset_at.unwrap_or(now),
        });
    }
    proposals::generate_for_slot(board, catalog, slot, PROPOSALS_PER_SLOT, engine_seed);
    board
        .slot_mut(slot)
        .reroll
        .consume(now, Duration::days(REROLL_COOLDOWN_DAYS));
    board.push_log(LOG_SLOT_REROLLED);
    log::debug!("user {}: rerolled {slot} proposals", board.user_id);
    Ok(())
}

/// Weekly cron entry point: expire stale selections, then auto-fill every
/// slot that lacks one. Slots that already hold a selection are untouched,
/// so the sweep is idempotent.
///
/// The game mode is best-effort; when the lookup yielded nothing, every slot
/// falls back to its first proposal with no target override.
pub fn run_weekly_auto_selection(
    board: &mut Board,
    catalog: &MissionCatalog,
    mode: Option<GameModeCode>,
    now: DateTime<Utc>,
    engine_seed: u64,
) {
    expire_stale_selections(board, now);
    for slot in SlotKey::ALL {
        if board.slot(slot).selected.is_some() {
            continue;
        }
        proposals::regenerate_if_empty(board, catalog, slot, PROPOSALS_PER_SLOT, engine_seed);
        let candidates = &board.slot(slot).proposals;
        if candidates.is_empty() {
            continue;
        }
        let (index, target_override) = auto_pick(slot, candidates, mode);
        let proposal = board.slot_mut(slot).proposals.remove(index);
        commit_selection(board, slot, proposal, now, target_override);
        board.push_log(LOG_MISSION_AUTO_SELECTED);
    }
}

/// Slot-specific auto-selection policy.
fn auto_pick(
    slot: SlotKey,
    candidates: &[Proposal],
    mode: Option<GameModeCode>,
) -> (usize, Option<u32>) {
    match (slot, mode) {
        (SlotKey::Hunt, Some(mode)) => {
            let tier = mode.tier();
            let index = (tier as usize - 1).min(candidates.len() - 1);
            (index, Some(tier))
        }
        (SlotKey::Main, Some(GameModeCode::Evolve)) => {
            let index = candidates
                .iter()
                .position(|p| p.template.difficulty == Difficulty::High)
                .unwrap_or(0);
            (index, None)
        }
        _ => (0, None),
    }
}

/// Drop active selections whose window has passed. Completed and claimed
/// selections are never expired away.
fn expire_stale_selections(board: &mut Board, now: DateTime<Utc>) {
    for slot in SlotKey::ALL {
        let state = board.slot_mut(slot);
        let expired = state
            .selected
            .as_ref()
            .is_some_and(|sel| sel.status == SelectionStatus::Active && now >= sel.expires_at);
        if expired {
            state.selected = None;
            board.push_log(LOG_MISSION_EXPIRED);
        }
    }
}

/// Install a proposal as the slot's committed selection. The proposal has
/// already been consumed from the slot's candidate list by the caller.
fn commit_selection(
    board: &mut Board,
    slot: SlotKey,
    proposal: Proposal,
    now: DateTime<Utc>,
    target_override: Option<u32>,
) {
    let objective = proposal.primary_objective();
    let target = target_override
        .unwrap_or_else(|| objective.map_or(MIN_PROGRESS_TARGET, |o| o.target))
        .max(MIN_PROGRESS_TARGET);
    let unit = objective.map(|o| o.unit.clone()).unwrap_or_default();

    if slot == SlotKey::Hunt {
        board.booster.target_task_id = None;
        board.booster.applied_keys.clear();
        board.booster.multiplier = proposal.booster_multiplier();
    }

    let ttl = Duration::days(slot.selection_ttl_days());
    board.slot_mut(slot).selected = Some(Selection {
        mission: proposal,
        status: SelectionStatus::Active,
        selected_at: now,
        updated_at: now,
        expires_at: now + ttl,
        progress: Progress {
            current: 0,
            target,
            unit,
            updated_at: now,
        },
        claim: None,
    });
}
