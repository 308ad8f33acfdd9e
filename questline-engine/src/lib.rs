//! Questline Mission Board Engine
//!
//! Platform-agnostic core logic for the Questline habit product: three
//! concurrent mission slots per user, a weekly proposal/selection/reroll
//! cycle, an XP booster gated by an at-most-once ledger, and a recurring
//! boss encounter whose shield depletes from hunt-slot activity. This crate
//! has no UI or transport dependencies; persistence, game-mode lookup, and
//! wall-clock access are injected behind traits.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};

pub mod board;
pub mod boss;
pub mod catalog;
pub mod claim;
pub mod constants;
pub mod error;
pub mod progress;
pub mod proposals;
pub mod selection;
pub mod snapshot;
pub mod store;

mod rng;

// Re-export commonly used types
pub use board::{
    Board, Booster, Boss, BossPhase, ClaimReceipt, GameModeCode, GameModeMap, Phase2, Progress,
    Proposal, ProposalList, Reroll, Selection, SelectionStatus, Shield, SlotKey, SlotState,
    season_id_for,
};
pub use boss::{register_phase2, run_boss_maintenance};
pub use catalog::{Difficulty, MissionCatalog, MissionTemplate, Objective, Reward};
pub use claim::claim_reward;
pub use error::BoardError;
pub use progress::{BoostOutcome, CompletionEvent, apply_hunt_boost, link_daily_task};
pub use proposals::{generate_for_slot, regenerate_if_empty};
pub use selection::{refresh_rerolls, reroll_slot, run_weekly_auto_selection, select_mission};
pub use snapshot::{
    BoardSnapshot, BossSnapshot, Phase2Snapshot, RerollSnapshot, SelectionSnapshot, ShieldSnapshot,
    SlotSnapshot,
};
pub use store::MemoryBoardStore;

/// Trait for abstracting board persistence.
/// Platform-specific implementations should provide this.
pub trait BoardStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the board for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, user_id: &str) -> Result<Option<Board>, Self::Error>;

    /// Persist the board for a user, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn store(&self, user_id: &str, board: &Board) -> Result<(), Self::Error>;
}

/// Best-effort game-mode profile lookup.
///
/// Absence is not an error: a user without a mode gets the default
/// auto-selection policy instead of a failed weekly sweep.
pub trait ModeProvider {
    fn game_mode(&self, user_id: &str) -> Option<GameModeCode>;
}

/// Provider that reports no game mode for anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModeProvider;

impl ModeProvider for NoModeProvider {
    fn game_mode(&self, _user_id: &str) -> Option<GameModeCode> {
        None
    }
}

/// Fixed map-backed provider for tests and simple integrations.
#[derive(Debug, Clone, Default)]
pub struct StaticModeProvider {
    modes: GameModeMap,
}

impl StaticModeProvider {
    #[must_use]
    pub fn new(modes: GameModeMap) -> Self {
        Self { modes }
    }

    /// Builder-style helper assigning a mode to one user.
    #[must_use]
    pub fn with_mode(mut self, user_id: &str, mode: GameModeCode) -> Self {
        self.modes.insert(user_id.to_string(), mode);
        self
    }
}

impl ModeProvider for StaticModeProvider {
    fn game_mode(&self, user_id: &str) -> Option<GameModeCode> {
        self.modes.get(user_id).copied()
    }
}

/// Trait for abstracting wall-clock access so time windows are testable.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shareable manual clock for tests and deterministic simulations.
///
/// Clones observe the same instant; advancing one advances them all.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Main engine facade owning the catalog and the injected collaborators.
///
/// All mutating operations for a given user must be serialized by the
/// caller; operations for different users are fully independent. Every
/// mutating call persists the board and returns a snapshot, never a
/// reference into live state.
pub struct MissionBoardEngine<S, M, C>
where
    S: BoardStorage,
    M: ModeProvider,
    C: Clock,
{
    catalog: MissionCatalog,
    storage: S,
    modes: M,
    clock: C,
    seed: u64,
}

impl MissionBoardEngine<MemoryBoardStore, NoModeProvider, SystemClock> {
    /// In-memory engine over the embedded catalog, for simple hosts.
    #[must_use]
    pub fn in_memory(seed: u64) -> Self {
        Self::new(
            MissionCatalog::load_from_static(),
            MemoryBoardStore::new(),
            NoModeProvider,
            SystemClock,
            seed,
        )
    }
}

impl<S, M, C> MissionBoardEngine<S, M, C>
where
    S: BoardStorage,
    M: ModeProvider,
    C: Clock,
{
    /// Create an engine with the provided catalog and collaborators.
    pub const fn new(catalog: MissionCatalog, storage: S, modes: M, clock: C, seed: u64) -> Self {
        Self {
            catalog,
            storage,
            modes,
            clock,
            seed,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &MissionCatalog {
        &self.catalog
    }

    /// Current board snapshot, creating a default board on first access.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store fails.
    pub fn board(&self, user_id: &str) -> Result<BoardSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        selection::refresh_rerolls(&mut board, self.clock.now());
        self.persist(&board)?;
        Ok(BoardSnapshot::from(&board))
    }

    /// Commit a proposal into a slot.
    ///
    /// # Errors
    ///
    /// `MissionNotFound` when the proposal id is not among the slot's
    /// current candidates; `Storage` when the backing store fails.
    pub fn select_mission(
        &self,
        user_id: &str,
        slot: SlotKey,
        proposal_id: &str,
    ) -> Result<BoardSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        selection::select_mission(&mut board, slot, proposal_id, now)?;
        self.persist(&board)?;
        Ok(BoardSnapshot::from(&board))
    }

    /// Discard a slot's proposals for a fresh batch.
    ///
    /// # Errors
    ///
    /// `RerollExhausted` when the quota is spent and the cooldown has not
    /// elapsed; `Storage` when the backing store fails.
    pub fn reroll(&self, user_id: &str, slot: SlotKey) -> Result<SlotSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        selection::reroll_slot(&mut board, &self.catalog, slot, now, self.seed)?;
        self.persist(&board)?;
        Ok(SlotSnapshot::from(board.slot(slot)))
    }

    /// Weekly cron entry point: expire stale selections and auto-fill every
    /// slot lacking one, using the user's game mode when available.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store fails; a missing game
    /// mode degrades to the default policy instead of failing.
    pub fn run_weekly_auto_selection(&self, user_id: &str) -> Result<BoardSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        let mode = self.modes.game_mode(user_id);
        selection::run_weekly_auto_selection(&mut board, &self.catalog, mode, now, self.seed);
        self.persist(&board)?;
        Ok(BoardSnapshot::from(&board))
    }

    /// Attach the XP booster to a daily task for the current hunt mission.
    ///
    /// # Errors
    ///
    /// `MissionMismatch` when the mission id is not the hunt slot's active
    /// selection; `Storage` when the backing store fails.
    pub fn link_daily_to_hunt_mission(
        &self,
        user_id: &str,
        mission_id: &str,
        daily_task_id: &str,
    ) -> Result<BoardSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        progress::link_daily_task(&mut board, mission_id, daily_task_id, now)?;
        self.persist(&board)?;
        Ok(BoardSnapshot::from(&board))
    }

    /// Apply the hunt XP booster for one daily submission. Idempotent per
    /// `(date, linked task)`; replays pass the inputs through unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store fails.
    pub fn apply_hunt_xp_boost(
        &self,
        user_id: &str,
        event: &CompletionEvent,
    ) -> Result<BoostOutcome, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        let outcome = progress::apply_hunt_boost(&mut board, event, now);
        self.persist(&board)?;
        Ok(outcome)
    }

    /// Submit phase-2 proof for an exposed boss. Re-submission is an
    /// idempotent no-op.
    ///
    /// # Errors
    ///
    /// `MissionMismatch` when the mission id does not match the hunt
    /// selection; `BossNotReady` while the shield holds; `Storage` when the
    /// backing store fails.
    pub fn register_boss_phase2(
        &self,
        user_id: &str,
        mission_id: &str,
        proof: &str,
    ) -> Result<BossSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        boss::register_phase2(&mut board, mission_id, proof, now)?;
        self.persist(&board)?;
        Ok(BossSnapshot::from(&board.boss))
    }

    /// Fortnightly cron entry point: recycle a defeated boss encounter.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store fails.
    pub fn run_fortnightly_boss_maintenance(
        &self,
        user_id: &str,
    ) -> Result<BoardSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        boss::run_boss_maintenance(&mut board, &self.catalog, now, self.seed);
        self.persist(&board)?;
        Ok(BoardSnapshot::from(&board))
    }

    /// Claim the reward of a completed mission. Claiming again returns the
    /// original receipt unchanged.
    ///
    /// # Errors
    ///
    /// `MissionNotActive` when no committed selection carries the mission
    /// id; `ClaimNotReady` before the mission is completed; `Storage` when
    /// the backing store fails.
    pub fn claim_mission_reward(
        &self,
        user_id: &str,
        mission_id: &str,
    ) -> Result<SelectionSnapshot, BoardError> {
        let mut board = self.ensure(user_id)?;
        let now = self.clock.now();
        selection::refresh_rerolls(&mut board, now);
        let slot = claim::claim_reward(&mut board, mission_id, now)?;
        self.persist(&board)?;
        let selection = board.slot(slot).selected.as_ref().ok_or_else(|| {
            BoardError::MissionNotActive {
                user_id: user_id.to_string(),
                mission_id: mission_id.to_string(),
            }
        })?;
        Ok(SelectionSnapshot::from(selection))
    }

    /// Single construction path for boards: load the stored board or build
    /// a fresh one with proposals in every slot.
    fn ensure(&self, user_id: &str) -> Result<Board, BoardError> {
        match self.storage.load(user_id) {
            Ok(Some(board)) => Ok(board),
            Ok(None) => {
                let now = self.clock.now();
                let mut board = Board::new(user_id, now);
                for slot in SlotKey::ALL {
                    proposals::generate_for_slot(
                        &mut board,
                        &self.catalog,
                        slot,
                        constants::PROPOSALS_PER_SLOT,
                        self.seed,
                    );
                }
                board.push_log(constants::LOG_BOARD_CREATED);
                log::info!("user {user_id}: board created for season {}", board.season_id);
                Ok(board)
            }
            Err(err) => Err(BoardError::Storage {
                user_id: user_id.to_string(),
                source: anyhow::Error::new(err),
            }),
        }
    }

    fn persist(&self, board: &Board) -> Result<(), BoardError> {
        self.storage
            .store(&board.user_id, board)
            .map_err(|err| BoardError::Storage {
                user_id: board.user_id.clone(),
                source: anyhow::Error::new(err),
            })
    }
}
