//! Completion events, hunt progress, and the XP booster ledger.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Board, SelectionStatus, SlotKey};
use crate::constants::{
    BOOSTER_FALLBACK_MIN_XP, BOOSTER_FALLBACK_RATIO, LOG_BOOSTER_APPLIED, LOG_BOOSTER_LINKED,
    LOG_BOSS_EXPOSED, LOG_MISSION_COMPLETED,
};
use crate::error::BoardError;

/// A day's completed task set as reported by the daily quest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub date: NaiveDate,
    pub completed_task_ids: Vec<String>,
    pub base_xp_delta: i64,
    pub xp_total_today: i64,
}

/// Booster result folded back into the daily quest response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostOutcome {
    pub xp_delta: i64,
    pub xp_total_today: i64,
    pub booster_applied: bool,
    pub multiplier: f64,
}

impl BoostOutcome {
    /// Pass the event through untouched.
    fn pass_through(event: &CompletionEvent, multiplier: f64) -> Self {
        Self {
            xp_delta: event.base_xp_delta,
            xp_total_today: event.xp_total_today,
            booster_applied: false,
            multiplier,
        }
    }
}

/// Attach the booster to a daily task for the current hunt mission.
///
/// Re-linking clears the idempotency ledger and restarts the boss encounter
/// at full shield.
pub fn link_daily_task(
    board: &mut Board,
    mission_id: &str,
    daily_task_id: &str,
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
    board.booster.target_task_id = Some(daily_task_id.to_string());
    board.booster.applied_keys.clear();
    board.boss.relink(daily_task_id, now);
    board.push_log(LOG_BOOSTER_LINKED);
    log::debug!(
        "user {}: linked daily task {daily_task_id} to hunt mission",
        board.user_id
    );
    Ok(())
}

/// Apply the hunt XP booster for one daily submission.
///
/// Safe to call any number of times for the same `(date, task)` pair: the
/// first call applies the bonus and every replay passes the inputs through
/// unchanged. Never fails; a board with nothing to boost is a no-op.
pub fn apply_hunt_boost(
    board: &mut Board,
    event: &CompletionEvent,
    now: DateTime<Utc>,
) -> BoostOutcome {
    let multiplier = board.booster.multiplier;

    let Some(selection) = board.hunt_selection() else {
        return BoostOutcome::pass_through(event, multiplier);
    };
    let reward_xp = selection.mission.template.reward.xp;

    let Some(target_task) = board.booster.target_task_id.clone() else {
        return BoostOutcome::pass_through(event, multiplier);
    };
    if !event.completed_task_ids.iter().any(|id| *id == target_task) {
        return BoostOutcome::pass_through(event, multiplier);
    }

    let key = booster_key(event.date, &target_task);
    if board.booster.applied_keys.contains(&key) {
        return BoostOutcome::pass_through(event, multiplier);
    }
    board.booster.applied_keys.insert(key);

    let bonus = bonus_for(event.base_xp_delta, multiplier, reward_xp);

    if let Some(selection) = board.slot_mut(SlotKey::Hunt).selected.as_mut() {
        let reached = selection.progress.advance(now);
        selection.updated_at = now;
        if reached && selection.status == SelectionStatus::Active {
            selection.status = SelectionStatus::Completed;
            board.push_log(LOG_MISSION_COMPLETED);
        }
    }

    if board.boss.absorb_hit(now) {
        board.push_log(LOG_BOSS_EXPOSED);
    }

    board.push_log(LOG_BOOSTER_APPLIED);
    log::debug!(
        "user {}: booster applied for {} (+{bonus} xp)",
        board.user_id,
        event.date
    );

    BoostOutcome {
        xp_delta: event.base_xp_delta + bonus,
        xp_total_today: event.xp_total_today + bonus,
        booster_applied: true,
        multiplier,
    }
}

/// Idempotency token for one (date, task) pair.
fn booster_key(date: NaiveDate, task_id: &str) -> String {
    format!("{date}:{task_id}")
}

/// Bonus XP for a boosted completion, with a nominal floor so zero-XP
/// completions still grant something.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn bonus_for(base_xp_delta: i64, multiplier: f64, reward_xp: i64) -> i64 {
    let raw = (base_xp_delta as f64 * (multiplier - 1.0)).round();
    if raw.is_finite() && raw > 0.0 {
        raw as i64
    } else {
        ((reward_xp as f64 * BOOSTER_FALLBACK_RATIO).round() as i64).max(BOOSTER_FALLBACK_MIN_XP)
    }
}
