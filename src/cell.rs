/// One square of the minefield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Mines in the 8-neighborhood. Always 0 for mine cells.
    pub adjacent_mines: u8,
}

impl Cell {
    pub fn can_be_revealed(&self) -> bool {
        !self.is_revealed && !self.is_flagged
    }

    pub fn can_be_flagged(&self) -> bool {
        !self.is_revealed
    }
}
