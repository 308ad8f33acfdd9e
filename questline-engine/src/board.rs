//! Per-user mission board state.
//!
//! The `Board` is the single mutable aggregate the engine works on. External
//! callers never see it directly; every public operation returns a snapshot
//! (see `snapshot`).
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{MissionTemplate, Objective, Reward};
use crate::constants::{BOSS_SHIELD_MAX, DEFAULT_BOOSTER_MULTIPLIER, REROLL_TOTAL};

/// Maximum proposal capacity stored inline without additional allocations.
pub type ProposalList = SmallVec<[Proposal; 4]>;

/// One of the three concurrent mission tracks a user runs at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKey {
    Main,
    Hunt,
    Skill,
}

impl SlotKey {
    pub const ALL: [Self; 3] = [Self::Main, Self::Hunt, Self::Skill];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Hunt => "hunt",
            Self::Skill => "skill",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Main => 0,
            Self::Hunt => 1,
            Self::Skill => 2,
        }
    }

    /// Days before a committed selection in this slot expires.
    #[must_use]
    pub const fn selection_ttl_days(self) -> i64 {
        match self {
            Self::Skill => crate::constants::SKILL_SELECTION_TTL_DAYS,
            Self::Main | Self::Hunt => crate::constants::SELECTION_TTL_DAYS,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "hunt" => Ok(Self::Hunt),
            "skill" => Ok(Self::Skill),
            _ => Err(()),
        }
    }
}

/// Game-mode code reported by the external profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameModeCode {
    Low,
    Chill,
    Flow,
    Evolve,
}

impl GameModeCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Chill => "CHILL",
            Self::Flow => "FLOW",
            Self::Evolve => "EVOLVE",
        }
    }

    /// Difficulty tier used by hunt auto-selection.
    #[must_use]
    pub const fn tier(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Chill => 2,
            Self::Flow => 3,
            Self::Evolve => 4,
        }
    }
}

impl fmt::Display for GameModeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameModeCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "CHILL" => Ok(Self::Chill),
            "FLOW" => Ok(Self::Flow),
            "EVOLVE" => Ok(Self::Evolve),
            _ => Err(()),
        }
    }
}

/// A user-scoped candidate mission offered for selection into a slot.
///
/// Proposal identity is generation-scoped: regenerating the same template
/// produces a fresh id, so stale selections can never resolve against a
/// newer proposal batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub template: MissionTemplate,
}

impl Proposal {
    #[must_use]
    pub fn primary_objective(&self) -> Option<&Objective> {
        self.template.primary_objective()
    }

    /// Multiplier this mission grants while linked, falling back to the
    /// engine default when the template does not carry one.
    #[must_use]
    pub fn booster_multiplier(&self) -> f64 {
        self.template
            .booster_multiplier
            .unwrap_or(DEFAULT_BOOSTER_MULTIPLIER)
    }
}

/// Lifecycle of a committed selection. Status only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStatus {
    Active,
    Completed,
    Claimed,
}

impl SelectionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Claimed => "claimed",
        }
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress counter for a committed selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub target: u32,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Advance by one step, capped at the target.
    /// Returns true when the target is reached.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        self.current = self.current.saturating_add(1).min(self.target);
        self.updated_at = now;
        self.current >= self.target
    }
}

/// Receipt stamped when a completed mission's reward is claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub claimed_at: DateTime<Utc>,
    pub reward: Reward,
}

/// The proposal a user has committed to for a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub mission: Proposal,
    pub status: SelectionStatus,
    pub selected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub progress: Progress,
    #[serde(default)]
    pub claim: Option<ClaimReceipt>,
}

/// Weekly reroll quota for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reroll {
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_reset_at: Option<DateTime<Utc>>,
    pub remaining: u8,
    pub total: u8,
}

impl Default for Reroll {
    fn default() -> Self {
        Self {
            used_at: None,
            next_reset_at: None,
            remaining: REROLL_TOTAL,
            total: REROLL_TOTAL,
        }
    }
}

impl Reroll {
    /// Restore the quota once the cooldown window has elapsed.
    ///
    /// An unset `next_reset_at` counts as elapsed so a board bootstrapped in
    /// an exhausted state can never stay stuck.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        if self.remaining > 0 {
            return;
        }
        let elapsed = self.next_reset_at.is_none_or(|reset| now >= reset);
        if elapsed {
            self.remaining = self.total;
            self.used_at = None;
            self.next_reset_at = None;
        }
    }

    /// Spend one reroll and arm the cooldown window when the quota is gone.
    pub fn consume(&mut self, now: DateTime<Utc>, cooldown: chrono::Duration) {
        self.remaining = self.remaining.saturating_sub(1);
        self.used_at = Some(now);
        if self.remaining == 0 {
            self.next_reset_at = Some(now + cooldown);
        }
    }
}

/// State for one mission track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotState {
    pub slot: SlotKey,
    #[serde(default)]
    pub proposals: ProposalList,
    #[serde(default)]
    pub selected: Option<Selection>,
    pub reroll: Reroll,
}

impl SlotState {
    #[must_use]
    pub fn new(slot: SlotKey) -> Self {
        Self {
            slot,
            proposals: ProposalList::new(),
            selected: None,
            reroll: Reroll::default(),
        }
    }

    /// Find an offered proposal by id.
    #[must_use]
    pub fn find_proposal(&self, proposal_id: &str) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == proposal_id)
    }
}

/// Boss encounter phase. Serialized as the numeric phase (1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum BossPhase {
    Shielded,
    Exposed,
}

impl From<BossPhase> for u8 {
    fn from(value: BossPhase) -> Self {
        match value {
            BossPhase::Shielded => 1,
            BossPhase::Exposed => 2,
        }
    }
}

impl TryFrom<u8> for BossPhase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Shielded),
            2 => Ok(Self::Exposed),
            other => Err(format!("invalid boss phase {other}")),
        }
    }
}

/// Shield charge pool protecting the boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    pub current: u32,
    pub max: u32,
    pub updated_at: DateTime<Utc>,
}

/// Second-phase submission state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Phase2 {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub proof: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Recurring encounter whose shield depletes from hunt-slot activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boss {
    pub phase: BossPhase,
    pub shield: Shield,
    #[serde(default)]
    pub linked_daily_task_id: Option<String>,
    #[serde(default)]
    pub linked_at: Option<DateTime<Utc>>,
    pub phase2: Phase2,
}

impl Boss {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            phase: BossPhase::Shielded,
            shield: Shield {
                current: BOSS_SHIELD_MAX,
                max: BOSS_SHIELD_MAX,
                updated_at: now,
            },
            linked_daily_task_id: None,
            linked_at: None,
            phase2: Phase2::default(),
        }
    }

    /// Restart the encounter against a freshly linked daily task.
    pub fn relink(&mut self, daily_task_id: &str, now: DateTime<Utc>) {
        self.phase = BossPhase::Shielded;
        self.shield.current = self.shield.max;
        self.shield.updated_at = now;
        self.linked_daily_task_id = Some(daily_task_id.to_string());
        self.linked_at = Some(now);
        self.phase2 = Phase2::default();
    }

    /// Absorb one hit. Returns true when this hit dropped the shield to zero.
    pub fn absorb_hit(&mut self, now: DateTime<Utc>) -> bool {
        if self.shield.current == 0 {
            return false;
        }
        self.shield.current -= 1;
        self.shield.updated_at = now;
        if self.shield.current == 0 {
            self.phase = BossPhase::Exposed;
            self.phase2.ready = true;
            return true;
        }
        false
    }

    /// Recycle a defeated encounter back to a full shield.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.phase = BossPhase::Shielded;
        self.shield.current = self.shield.max;
        self.shield.updated_at = now;
        self.linked_daily_task_id = None;
        self.linked_at = None;
        self.phase2 = Phase2::default();
    }
}

/// XP booster attached to the hunt slot. Internal only; never serialized
/// into snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    pub multiplier: f64,
    #[serde(default)]
    pub target_task_id: Option<String>,
    /// `"{date}:{taskId}"` tokens already applied to XP. A token is applied
    /// at most once, ever.
    #[serde(default)]
    pub applied_keys: HashSet<String>,
}

impl Default for Booster {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_BOOSTER_MULTIPLIER,
            target_task_id: None,
            applied_keys: HashSet::new(),
        }
    }
}

/// The per-user mission board aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub user_id: String,
    pub season_id: String,
    pub generated_at: DateTime<Utc>,
    pub slots: [SlotState; 3],
    pub boss: Boss,
    pub booster: Booster,
    /// Monotonic counter scoping proposal ids to their generation event.
    pub proposal_seq: u64,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl Board {
    /// Create an empty board. Proposals are seeded by the engine facade,
    /// which owns the catalog and the RNG seed.
    #[must_use]
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            season_id: season_id_for(now),
            generated_at: now,
            slots: [
                SlotState::new(SlotKey::Main),
                SlotState::new(SlotKey::Hunt),
                SlotState::new(SlotKey::Skill),
            ],
            boss: Boss::new(now),
            booster: Booster::default(),
            proposal_seq: 0,
            logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn slot(&self, key: SlotKey) -> &SlotState {
        &self.slots[key.index()]
    }

    pub fn slot_mut(&mut self, key: SlotKey) -> &mut SlotState {
        &mut self.slots[key.index()]
    }

    /// The active hunt selection, if any.
    #[must_use]
    pub fn hunt_selection(&self) -> Option<&Selection> {
        self.slot(SlotKey::Hunt).selected.as_ref()
    }

    /// Slot whose committed selection carries the given mission id.
    #[must_use]
    pub fn find_selected_slot(&self, mission_id: &str) -> Option<SlotKey> {
        SlotKey::ALL.into_iter().find(|&key| {
            self.slot(key)
                .selected
                .as_ref()
                .is_some_and(|sel| sel.mission.id == mission_id)
        })
    }

    pub(crate) fn push_log(&mut self, key: &str) {
        self.logs.push(key.to_string());
    }

    pub(crate) fn next_proposal_seq(&mut self) -> u64 {
        self.proposal_seq = self.proposal_seq.wrapping_add(1);
        self.proposal_seq
    }
}

/// Season identifier from the ISO week of the given instant, e.g. `2026-W32`.
#[must_use]
pub fn season_id_for(now: DateTime<Utc>) -> String {
    let week = now.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Per-user game-mode tags kept as a plain map for simple integrations.
pub type GameModeMap = HashMap<String, GameModeCode>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn slot_key_roundtrips_strings() {
        for slot in SlotKey::ALL {
            assert_eq!(slot.as_str().parse::<SlotKey>(), Ok(slot));
        }
        assert!("raid".parse::<SlotKey>().is_err());
    }

    #[test]
    fn game_mode_tiers_are_ordered() {
        let tiers: Vec<u32> = ["LOW", "CHILL", "FLOW", "EVOLVE"]
            .iter()
            .map(|code| code.parse::<GameModeCode>().unwrap().tier())
            .collect();
        assert_eq!(tiers, vec![1, 2, 3, 4]);
        assert!("TURBO".parse::<GameModeCode>().is_err());
    }

    #[test]
    fn reroll_refresh_waits_for_cooldown() {
        let mut reroll = Reroll::default();
        reroll.consume(t0(), Duration::days(7));
        assert_eq!(reroll.remaining, 0);
        assert_eq!(reroll.next_reset_at, Some(t0() + Duration::days(7)));

        reroll.refresh(t0() + Duration::days(6));
        assert_eq!(reroll.remaining, 0, "cooldown has not elapsed");

        reroll.refresh(t0() + Duration::days(7));
        assert_eq!(reroll.remaining, reroll.total);
        assert!(reroll.used_at.is_none());
        assert!(reroll.next_reset_at.is_none());
    }

    #[test]
    fn reroll_refresh_treats_unset_reset_as_elapsed() {
        let mut reroll = Reroll {
            remaining: 0,
            next_reset_at: None,
            ..Reroll::default()
        };
        reroll.refresh(t0());
        assert_eq!(reroll.remaining, reroll.total);
    }

    #[test]
    fn progress_advance_caps_at_target() {
        let mut progress = Progress {
            current: 0,
            target: 2,
            unit: "days".to_string(),
            updated_at: t0(),
        };
        assert!(!progress.advance(t0()));
        assert!(progress.advance(t0()));
        assert!(progress.advance(t0()), "stays complete once capped");
        assert_eq!(progress.current, 2);
    }

    #[test]
    fn boss_absorbs_hits_until_exposed() {
        let mut boss = Boss::new(t0());
        boss.shield.current = 2;
        assert!(!boss.absorb_hit(t0()));
        assert_eq!(boss.phase, BossPhase::Shielded);
        assert!(boss.absorb_hit(t0()));
        assert_eq!(boss.phase, BossPhase::Exposed);
        assert!(boss.phase2.ready);
        // Further hits are absorbed by the floor, not the shield.
        assert!(!boss.absorb_hit(t0()));
        assert_eq!(boss.shield.current, 0);
    }

    #[test]
    fn boss_relink_restarts_encounter() {
        let mut boss = Boss::new(t0());
        boss.shield.current = 0;
        boss.phase = BossPhase::Exposed;
        boss.phase2.ready = true;
        boss.phase2.proof = Some("proof".to_string());

        boss.relink("task-9", t0() + Duration::days(1));
        assert_eq!(boss.phase, BossPhase::Shielded);
        assert_eq!(boss.shield.current, boss.shield.max);
        assert_eq!(boss.linked_daily_task_id.as_deref(), Some("task-9"));
        assert_eq!(boss.phase2, Phase2::default());
    }

    #[test]
    fn boss_phase_serializes_as_number() {
        let boss = Boss::new(t0());
        let json = serde_json::to_value(&boss).unwrap();
        assert_eq!(json["phase"], 1);
        let parsed: Boss = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.phase, BossPhase::Shielded);
    }

    #[test]
    fn season_id_uses_iso_week() {
        let id = season_id_for(t0());
        assert_eq!(id, "2024-W01");
    }

    #[test]
    fn board_has_exactly_three_slots() {
        let board = Board::new("user-1", t0());
        assert_eq!(board.slots.len(), 3);
        for slot in SlotKey::ALL {
            assert_eq!(board.slot(slot).slot, slot);
            assert!(board.slot(slot).proposals.is_empty());
        }
        assert_eq!(board.boss.shield.current, board.boss.shield.max);
    }
}
