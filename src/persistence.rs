//! Hand-off of finished games to an external store.

use crate::game::GameState;
use crate::player::PlayerId;

/// A finished game plus the aggregate counters a statistics store keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameRecord {
    pub state: GameState,
    pub rows: usize,
    pub cols: usize,
    pub mine_count: usize,
    pub cells_revealed: usize,
    pub flags_placed: usize,
    /// Someone stepped on a mine during the game.
    pub hit_mine: bool,
    /// Unix milliseconds when the mines were laid.
    pub started_at_ms: Option<u64>,
    /// Unix milliseconds when the game ended.
    pub finished_at_ms: Option<u64>,
    pub duration_ms: Option<u64>,
}

impl GameRecord {
    /// Record without timing information.
    pub fn from_state(state: GameState) -> Self {
        let board = &state.board;
        Self {
            rows: board.rows(),
            cols: board.cols(),
            mine_count: board.mine_count(),
            cells_revealed: board.count_revealed_safe(),
            flags_placed: state.placed_flag_count,
            hit_mine: board.cells().iter().any(|c| c.is_mine && c.is_revealed),
            started_at_ms: None,
            finished_at_ms: None,
            duration_ms: None,
            state,
        }
    }

    pub fn with_timing(mut self, started_at_ms: Option<u64>, finished_at_ms: Option<u64>) -> Self {
        self.started_at_ms = started_at_ms;
        self.finished_at_ms = finished_at_ms;
        self.duration_ms = match (started_at_ms, finished_at_ms) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        };
        self
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.state.status.winner()
    }
}

/// Store for completed games. Returns the identifier of the new record.
pub trait PersistenceService: Send {
    fn save_game(&mut self, record: GameRecord) -> anyhow::Result<u64>;
}

#[cfg(feature = "std")]
pub use memory::InMemoryPersistence;

#[cfg(feature = "std")]
mod memory {
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    use super::{GameRecord, PersistenceService};

    /// Process-local record store. Clones share the same records.
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryPersistence {
        records: Arc<Mutex<Vec<(u64, GameRecord)>>>,
    }

    impl InMemoryPersistence {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<(u64, GameRecord)> {
            match self.records.lock() {
                Ok(records) => records.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }

        pub fn len(&self) -> usize {
            self.records().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl PersistenceService for InMemoryPersistence {
        fn save_game(&mut self, record: GameRecord) -> anyhow::Result<u64> {
            let mut records = self
                .records
                .lock()
                .map_err(|_| anyhow::anyhow!("Record store lock poisoned"))?;
            let id = records.len() as u64 + 1;
            records.push((id, record));
            Ok(id)
        }
    }
}
