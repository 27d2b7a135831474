//! Minefield grid: mine placement, adjacency, flood-fill reveal and flags.

use alloc::vec;
use alloc::vec::Vec;
use rand::Rng;

use crate::cell::Cell;
use crate::common::{BoardError, Position};
use crate::config::MAX_BOARD_SIDE;

/// Cells uncovered by a single reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reveal {
    pub revealed: Vec<Position>,
    pub hit_mine: bool,
}

impl Reveal {
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }
}

/// Rectangular grid of cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board: no mines, nothing revealed or flagged.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
        }
    }

    /// Build a board from an authoritative mine list, recomputing adjacency
    /// locally. Duplicate coordinates collapse into one mine.
    pub fn with_mines(rows: usize, cols: usize, mines: &[Position]) -> Result<Self, BoardError> {
        check_dimensions(rows, cols)?;
        let mut board = Self::new(rows, cols);
        for &(row, col) in mines {
            let idx = board
                .index(row, col)
                .ok_or(BoardError::OutOfBounds { row, col })?;
            board.cells[idx].is_mine = true;
        }
        board.recompute_adjacency();
        Ok(board)
    }

    /// Validate an untrusted cell grid and wrap it in a board.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Result<Self, BoardError> {
        check_dimensions(rows, cols)?;
        if cells.len() != rows * cols {
            return Err(BoardError::CellCountMismatch {
                expected: rows * cols,
                actual: cells.len(),
            });
        }
        let board = Self { rows, cols, cells };
        for (pos, cell) in board.iter() {
            if cell.is_flagged && cell.is_revealed {
                return Err(BoardError::FlaggedAndRevealed(pos));
            }
            if cell.adjacent_mines > 8 {
                return Err(BoardError::AdjacencyMismatch(pos));
            }
            if !cell.is_mine && cell.adjacent_mines != board.count_adjacent_mines(pos.0, pos.1) {
                return Err(BoardError::AdjacencyMismatch(pos));
            }
        }
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|idx| &self.cells[idx])
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate `(position, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / cols, i % cols), cell))
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if self.in_bounds(row, col) {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = Position> {
        let (rows, cols) = (self.rows, self.cols);
        let r0 = row.saturating_sub(1);
        let c0 = col.saturating_sub(1);
        let r1 = (row + 1).min(rows.saturating_sub(1));
        let c1 = (col + 1).min(cols.saturating_sub(1));
        (r0..=r1)
            .flat_map(move |r| (c0..=c1).map(move |c| (r, c)))
            .filter(move |&pos| pos != (row, col))
    }

    fn count_adjacent_mines(&self, row: usize, col: usize) -> u8 {
        self.neighbors(row, col)
            .filter(|&(r, c)| self.cells[r * self.cols + c].is_mine)
            .count() as u8
    }

    fn recompute_adjacency(&mut self) {
        for idx in 0..self.cells.len() {
            let (row, col) = (idx / self.cols, idx % self.cols);
            self.cells[idx].adjacent_mines = if self.cells[idx].is_mine {
                0
            } else {
                self.count_adjacent_mines(row, col)
            };
        }
    }

    /// Place `mine_count` mines uniformly at random outside the 3x3 area
    /// centred on the first click, then recompute adjacency.
    pub fn generate_mines<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        first_row: usize,
        first_col: usize,
        mine_count: usize,
    ) -> Result<(), BoardError> {
        if !self.in_bounds(first_row, first_col) {
            return Err(BoardError::OutOfBounds {
                row: first_row,
                col: first_col,
            });
        }
        let mut candidates: Vec<Position> = self
            .iter()
            .map(|(pos, _)| pos)
            .filter(|&(r, c)| r.abs_diff(first_row) > 1 || c.abs_diff(first_col) > 1)
            .collect();
        if mine_count > 0 && mine_count >= candidates.len() {
            return Err(BoardError::TooManyMines {
                requested: mine_count,
                available: candidates.len(),
            });
        }

        for cell in self.cells.iter_mut() {
            cell.is_mine = false;
        }
        // Partial Fisher-Yates: the first `mine_count` slots become a uniform sample.
        for i in 0..mine_count {
            let j = rng.random_range(i..candidates.len());
            candidates.swap(i, j);
        }
        for &(r, c) in &candidates[..mine_count] {
            self.cells[r * self.cols + c].is_mine = true;
        }
        self.recompute_adjacency();
        Ok(())
    }

    /// Reveal a cell. A mine reveals only itself; a safe cell flood-fills
    /// through zero-adjacency neighbors. Out-of-bounds, revealed and
    /// flagged targets yield an empty result.
    pub fn reveal_cell(&mut self, row: usize, col: usize) -> Reveal {
        let Some(start) = self.index(row, col) else {
            return Reveal::default();
        };
        if !self.cells[start].can_be_revealed() {
            return Reveal::default();
        }
        if self.cells[start].is_mine {
            self.cells[start].is_revealed = true;
            return Reveal {
                revealed: vec![(row, col)],
                hit_mine: true,
            };
        }

        let mut revealed = Vec::new();
        let mut stack = vec![(row, col)];
        while let Some((r, c)) = stack.pop() {
            let idx = r * self.cols + c;
            let cell = &mut self.cells[idx];
            if !cell.can_be_revealed() || cell.is_mine {
                continue;
            }
            cell.is_revealed = true;
            revealed.push((r, c));
            if cell.adjacent_mines == 0 {
                stack.extend(self.neighbors(r, c).filter(|&(nr, nc)| {
                    let next = &self.cells[nr * self.cols + nc];
                    next.can_be_revealed() && !next.is_mine
                }));
            }
        }
        Reveal {
            revealed,
            hit_mine: false,
        }
    }

    /// Flip the flag on an unrevealed cell. Returns the new flag state, or
    /// `None` when the cell is revealed or out of bounds.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Option<bool> {
        let idx = self.index(row, col)?;
        let cell = &mut self.cells[idx];
        if !cell.can_be_flagged() {
            return None;
        }
        cell.is_flagged = !cell.is_flagged;
        Some(cell.is_flagged)
    }

    pub fn count_remaining_safe_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| !c.is_mine && !c.is_revealed)
            .count()
    }

    pub fn count_placed_flags(&self) -> usize {
        self.cells.iter().filter(|c| c.is_flagged).count()
    }

    /// Revealed cells that are not mines.
    pub fn count_revealed_safe(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.is_revealed && !c.is_mine)
            .count()
    }

    /// Whether any cell, mine or not, has been uncovered.
    pub fn any_revealed(&self) -> bool {
        self.cells.iter().any(|c| c.is_revealed)
    }

    pub fn mine_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_mine).count()
    }

    pub fn mine_positions(&self) -> Vec<Position> {
        self.iter()
            .filter(|(_, cell)| cell.is_mine)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Reveal every hidden mine, clearing flags on them. Returns the
    /// positions that changed.
    pub fn reveal_all_mines(&mut self) -> Vec<Position> {
        let cols = self.cols;
        let mut changed = Vec::new();
        for (i, cell) in self.cells.iter_mut().enumerate() {
            if cell.is_mine && !cell.is_revealed {
                cell.is_flagged = false;
                cell.is_revealed = true;
                changed.push((i / cols, i % cols));
            }
        }
        changed
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), BoardError> {
    if rows == 0 || cols == 0 || rows > MAX_BOARD_SIDE || cols > MAX_BOARD_SIDE {
        return Err(BoardError::InvalidDimensions { rows, cols });
    }
    Ok(())
}
