//! In-memory board storage.
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use crate::BoardStorage;
use crate::board::Board;

/// Process-local `BoardStorage` backed by a mutex-guarded map.
///
/// Boards live for the process lifetime; there is no eviction. Durability
/// is a concern for persistent `BoardStorage` implementations, not this one.
#[derive(Debug, Default)]
pub struct MemoryBoardStore {
    boards: Mutex<HashMap<String, Board>>,
}

impl MemoryBoardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boards currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BoardStorage for MemoryBoardStore {
    type Error = Infallible;

    fn load(&self, user_id: &str) -> Result<Option<Board>, Self::Error> {
        Ok(self
            .boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned())
    }

    fn store(&self, user_id: &str, board: &Board) -> Result<(), Self::Error> {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_string(), board.clone());
        Ok(())
    }
}
