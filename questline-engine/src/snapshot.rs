//! External read model.
//!
//! Every public operation returns one of these value objects instead of a
//! reference into the live board, so callers can serialize or mutate the
//! result freely without touching engine state. Timestamps serialize as
//! ISO-8601 strings; unset optional timestamps serialize as `null`. The
//! booster ledger is internal and has no snapshot form.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{
    Board, Boss, BossPhase, ClaimReceipt, Phase2, Progress, Proposal, Reroll, Selection,
    SelectionStatus, Shield, SlotKey, SlotState,
};
use crate::catalog::Reward;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current: u32,
    pub target: u32,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Progress> for ProgressSnapshot {
    fn from(progress: &Progress) -> Self {
        Self {
            current: progress.current,
            target: progress.target,
            unit: progress.unit.clone(),
            updated_at: progress.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSnapshot {
    pub claimed_at: DateTime<Utc>,
    pub reward: Reward,
}

impl From<&ClaimReceipt> for ClaimSnapshot {
    fn from(claim: &ClaimReceipt) -> Self {
        Self {
            claimed_at: claim.claimed_at,
            reward: claim.reward.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub mission: Proposal,
    pub status: SelectionStatus,
    pub selected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub progress: ProgressSnapshot,
    pub claim: Option<ClaimSnapshot>,
}

impl From<&Selection> for SelectionSnapshot {
    fn from(selection: &Selection) -> Self {
        Self {
            mission: selection.mission.clone(),
            status: selection.status,
            selected_at: selection.selected_at,
            updated_at: selection.updated_at,
            expires_at: selection.expires_at,
            progress: ProgressSnapshot::from(&selection.progress),
            claim: selection.claim.as_ref().map(ClaimSnapshot::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerollSnapshot {
    pub used_at: Option<DateTime<Utc>>,
    pub next_reset_at: Option<DateTime<Utc>>,
    pub remaining: u8,
    pub total: u8,
}

impl From<&Reroll> for RerollSnapshot {
    fn from(reroll: &Reroll) -> Self {
        Self {
            used_at: reroll.used_at,
            next_reset_at: reroll.next_reset_at,
            remaining: reroll.remaining,
            total: reroll.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot: SlotKey,
    pub proposals: Vec<Proposal>,
    pub selected: Option<SelectionSnapshot>,
    pub reroll: RerollSnapshot,
}

impl From<&SlotState> for SlotSnapshot {
    fn from(state: &SlotState) -> Self {
        Self {
            slot: state.slot,
            proposals: state.proposals.iter().cloned().collect(),
            selected: state.selected.as_ref().map(SelectionSnapshot::from),
            reroll: RerollSnapshot::from(&state.reroll),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldSnapshot {
    pub current: u32,
    pub max: u32,
    pub updated_at: DateTime<Utc>,
}

impl From<&Shield> for ShieldSnapshot {
    fn from(shield: &Shield) -> Self {
        Self {
            current: shield.current,
            max: shield.max,
            updated_at: shield.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Snapshot {
    pub ready: bool,
    pub proof: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<&Phase2> for Phase2Snapshot {
    fn from(phase2: &Phase2) -> Self {
        Self {
            ready: phase2.ready,
            proof: phase2.proof.clone(),
            submitted_at: phase2.submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub phase: BossPhase,
    pub shield: ShieldSnapshot,
    pub linked_daily_task_id: Option<String>,
    pub linked_at: Option<DateTime<Utc>>,
    pub phase2: Phase2Snapshot,
}

impl From<&Boss> for BossSnapshot {
    fn from(boss: &Boss) -> Self {
        Self {
            phase: boss.phase,
            shield: ShieldSnapshot::from(&boss.shield),
            linked_daily_task_id: boss.linked_daily_task_id.clone(),
            linked_at: boss.linked_at,
            phase2: Phase2Snapshot::from(&boss.phase2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub user_id: String,
    pub season_id: String,
    pub generated_at: DateTime<Utc>,
    pub slots: Vec<SlotSnapshot>,
    pub boss: BossSnapshot,
    pub logs: Vec<String>,
}

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        Self {
            user_id: board.user_id.clone(),
            season_id: board.season_id.clone(),
            generated_at: board.generated_at,
            slots: board.slots.iter().map(SlotSnapshot::from).collect(),
            boss: BossSnapshot::from(&board.boss),
            logs: board.logs.clone(),
        }
    }
}

impl BoardSnapshot {
    /// Snapshot of a single slot.
    #[must_use]
    pub fn slot(&self, key: SlotKey) -> Option<&SlotSnapshot> {
        self.slots.iter().find(|s| s.slot == key)
    }
}
