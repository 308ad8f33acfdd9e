//! Centralized tuning constants for Questline board logic.
//!
//! These values define the deterministic rules of the mission board.
//! Keeping them together ensures that progression can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_BOARD_CREATED: &str = "log.board.created";
pub(crate) const LOG_MISSION_SELECTED: &str = "log.mission.selected";
pub(crate) const LOG_MISSION_AUTO_SELECTED: &str = "log.mission.auto-selected";
pub(crate) const LOG_MISSION_COMPLETED: &str = "log.mission.completed";
pub(crate) const LOG_MISSION_CLAIMED: &str = "log.mission.claimed";
pub(crate) const LOG_MISSION_EXPIRED: &str = "log.mission.expired";
pub(crate) const LOG_SLOT_REROLLED: &str = "log.slot.rerolled";
pub(crate) const LOG_BOOSTER_LINKED: &str = "log.booster.linked";
pub(crate) const LOG_BOOSTER_APPLIED: &str = "log.booster.applied";
pub(crate) const LOG_BOSS_EXPOSED: &str = "log.boss.exposed";
pub(crate) const LOG_BOSS_PHASE2_SUBMITTED: &str = "log.boss.phase2-submitted";
pub(crate) const LOG_BOSS_RESET: &str = "log.boss.reset";

// Proposal generation -------------------------------------------------------
pub(crate) const PROPOSALS_PER_SLOT: usize = 4;

// Selection windows --------------------------------------------------------
pub(crate) const SELECTION_TTL_DAYS: i64 = 7;
pub(crate) const SKILL_SELECTION_TTL_DAYS: i64 = 14;

// Reroll quota -------------------------------------------------------------
pub(crate) const REROLL_TOTAL: u8 = 1;
pub(crate) const REROLL_COOLDOWN_DAYS: i64 = 7;

// Boss encounter -----------------------------------------------------------
pub(crate) const BOSS_SHIELD_MAX: u32 = 5;

// Booster tuning -----------------------------------------------------------
pub(crate) const DEFAULT_BOOSTER_MULTIPLIER: f64 = 1.5;
pub(crate) const BOOSTER_FALLBACK_RATIO: f64 = 0.1;
pub(crate) const BOOSTER_FALLBACK_MIN_XP: i64 = 10;

// Progress -----------------------------------------------------------------
pub(crate) const MIN_PROGRESS_TARGET: u32 = 1;
