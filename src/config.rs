//! Board presets, scoring constants and validated game configuration.

use crate::common::BoardError;

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 10;
pub const DEFAULT_MINES: usize = 15;

pub const POINTS_PER_CELL: i32 = 10;
pub const POINTS_PER_FLAG: i32 = 5;
pub const MINE_PENALTY: i32 = 30;

/// Largest accepted board side. Columns are addressed by a single letter.
pub const MAX_BOARD_SIDE: usize = 26;

/// Points awarded and deducted while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Scoring {
    pub per_cell: i32,
    pub per_flag: i32,
    pub mine_penalty: i32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            per_cell: POINTS_PER_CELL,
            per_flag: POINTS_PER_FLAG,
            mine_penalty: MINE_PENALTY,
        }
    }
}

/// Preset board sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(clap::ValueEnum))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// `(rows, cols, mines)` for the preset.
    pub const fn dimensions(self) -> (usize, usize, usize) {
        match self {
            Difficulty::Easy => (8, 8, 10),
            Difficulty::Medium => (DEFAULT_ROWS, DEFAULT_COLS, DEFAULT_MINES),
            Difficulty::Hard => (12, 12, 20),
            Difficulty::Expert => (14, 14, 30),
        }
    }

    pub fn config(self) -> GameConfig {
        let (rows, cols, mines) = self.dimensions();
        GameConfig {
            rows,
            cols,
            mines,
            scoring: Scoring::default(),
        }
    }
}

/// Board shape, mine count and scoring for one game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    pub scoring: Scoring,
}

impl Default for GameConfig {
    fn default() -> Self {
        Difficulty::Medium.config()
    }
}

impl GameConfig {
    /// Build and validate a configuration with default scoring.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self, BoardError> {
        let config = Self {
            rows,
            cols,
            mines,
            scoring: Scoring::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Cells that can hold a mine whatever the first click is. The excluded
    /// zone is largest when the click lands away from every edge.
    pub fn usable_cells(&self) -> usize {
        let zone = self.rows.min(3) * self.cols.min(3);
        self.cell_count() - zone
    }

    /// Reject shapes and mine counts that mine generation could not honor.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.rows == 0
            || self.cols == 0
            || self.rows > MAX_BOARD_SIDE
            || self.cols > MAX_BOARD_SIDE
        {
            return Err(BoardError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let available = self.usable_cells();
        if self.mines > 0 && self.mines >= available {
            return Err(BoardError::TooManyMines {
                requested: self.mines,
                available,
            });
        }
        Ok(())
    }
}

impl From<Difficulty> for GameConfig {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.config()
    }
}
