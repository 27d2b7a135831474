//! Common types for the board engine: coordinates and board errors.

/// `(row, col)` coordinate on the board.
pub type Position = (usize, usize);

/// Errors returned by board construction and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate outside the grid.
    OutOfBounds { row: usize, col: usize },
    /// Board shape is empty or larger than supported.
    InvalidDimensions { rows: usize, cols: usize },
    /// Not enough cells outside the opening area for the requested mines.
    TooManyMines { requested: usize, available: usize },
    /// Cell list does not match `rows * cols`.
    CellCountMismatch { expected: usize, actual: usize },
    /// A cell claims to be both flagged and revealed.
    FlaggedAndRevealed(Position),
    /// Stored adjacency count disagrees with the mines around the cell.
    AdjacencyMismatch(Position),
    /// Board shape differs from the local game configuration.
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::OutOfBounds { row, col } => {
                write!(f, "Position ({}, {}) is out of bounds", row, col)
            }
            BoardError::InvalidDimensions { rows, cols } => {
                write!(f, "Invalid board dimensions {}x{}", rows, cols)
            }
            BoardError::TooManyMines {
                requested,
                available,
            } => write!(
                f,
                "Cannot place {} mines, only {} cells are available",
                requested, available
            ),
            BoardError::CellCountMismatch { expected, actual } => {
                write!(f, "Expected {} cells, got {}", expected, actual)
            }
            BoardError::FlaggedAndRevealed((r, c)) => {
                write!(f, "Cell ({}, {}) is both flagged and revealed", r, c)
            }
            BoardError::AdjacencyMismatch((r, c)) => {
                write!(f, "Cell ({}, {}) has an inconsistent adjacency count", r, c)
            }
            BoardError::DimensionMismatch { expected, actual } => write!(
                f,
                "Board is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
