use alloc::boxed::Box;
use rand::Rng;

use crate::board::Board;
use crate::clock::Clock;
use crate::common::{BoardError, Position};
use crate::config::GameConfig;
use crate::persistence::{GameRecord, PersistenceService};
use crate::player::{Player, PlayerId};

/// Current status of a game. Anything but `Playing` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    Playing,
    Player1Won,
    Player2Won,
    Draw,
    /// Accepted from peers for compatibility; never produced locally.
    GameOver,
}

impl GameStatus {
    /// Wire name of the status.
    pub fn name(self) -> &'static str {
        match self {
            GameStatus::Playing => "PLAYING",
            GameStatus::Player1Won => "PLAYER1_WON",
            GameStatus::Player2Won => "PLAYER2_WON",
            GameStatus::Draw => "DRAW",
            GameStatus::GameOver => "GAME_OVER",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PLAYING" => Some(GameStatus::Playing),
            "PLAYER1_WON" => Some(GameStatus::Player1Won),
            "PLAYER2_WON" => Some(GameStatus::Player2Won),
            "DRAW" => Some(GameStatus::Draw),
            "GAME_OVER" => Some(GameStatus::GameOver),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::Playing
    }

    pub fn winner(self) -> Option<PlayerId> {
        match self {
            GameStatus::Player1Won => Some(PlayerId::One),
            GameStatus::Player2Won => Some(PlayerId::Two),
            _ => None,
        }
    }
}

/// Complete, self-contained snapshot of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub board: Board,
    pub player1: Player,
    pub player2: Player,
    pub current_player: PlayerId,
    pub status: GameStatus,
    pub remaining_safe_cells: usize,
    pub total_flag_capacity: usize,
    pub placed_flag_count: usize,
    pub is_first_move: bool,
    pub last_revealed_by: Option<PlayerId>,
}

impl GameState {
    pub fn player(&self, id: PlayerId) -> &Player {
        match id {
            PlayerId::One => &self.player1,
            PlayerId::Two => &self.player2,
        }
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        match id {
            PlayerId::One => &mut self.player1,
            PlayerId::Two => &mut self.player2,
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Revealed { cells: usize, hit_mine: bool },
    FlagPlaced,
    FlagRemoved,
}

/// Turn, score and status bookkeeping around one board.
pub struct GameSession {
    config: GameConfig,
    board: Board,
    player1: Player,
    player2: Player,
    current_player: PlayerId,
    status: GameStatus,
    is_first_move: bool,
    last_revealed_by: Option<PlayerId>,
    /// Set when the mine layout is laid or installed.
    started_at_ms: Option<u64>,
    clock: Option<Box<dyn Clock>>,
    persistence: Option<Box<dyn PersistenceService>>,
}

#[cfg(feature = "std")]
fn default_clock() -> Option<Box<dyn Clock>> {
    Some(Box::new(crate::clock::SystemClock))
}

#[cfg(not(feature = "std"))]
fn default_clock() -> Option<Box<dyn Clock>> {
    None
}

impl GameSession {
    /// Start a session. The configuration is validated before any board
    /// is allocated.
    pub fn new(config: GameConfig, player1: &str, player2: &str) -> Result<Self, BoardError> {
        config.validate()?;
        Ok(Self {
            config,
            board: Board::new(config.rows, config.cols),
            player1: Player::new(PlayerId::One, player1),
            player2: Player::new(PlayerId::Two, player2),
            current_player: PlayerId::One,
            status: GameStatus::Playing,
            is_first_move: true,
            last_revealed_by: None,
            started_at_ms: None,
            clock: default_clock(),
            persistence: None,
        })
    }

    /// Replace the time source. Without the `std` feature no clock is set
    /// and games are not timed.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_persistence(mut self, persistence: Box<dyn PersistenceService>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        match id {
            PlayerId::One => &self.player1,
            PlayerId::Two => &self.player2,
        }
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        match id {
            PlayerId::One => &mut self.player1,
            PlayerId::Two => &mut self.player2,
        }
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_first_move(&self) -> bool {
        self.is_first_move
    }

    pub fn last_revealed_by(&self) -> Option<PlayerId> {
        self.last_revealed_by
    }

    /// When the current game's mines were laid, in Unix milliseconds.
    pub fn started_at(&self) -> Option<u64> {
        self.started_at_ms
    }

    /// Rename a seat. The name is sanitized like any other.
    pub fn rename_player(&mut self, id: PlayerId, name: &str) {
        self.player_mut(id).rename(name);
    }

    pub fn remaining_safe_cells(&self) -> usize {
        self.board.count_remaining_safe_cells()
    }

    /// Copy of the whole game for display or broadcast.
    pub fn state(&self) -> GameState {
        GameState {
            board: self.board.clone(),
            player1: self.player1.clone(),
            player2: self.player2.clone(),
            current_player: self.current_player,
            status: self.status,
            remaining_safe_cells: self.board.count_remaining_safe_cells(),
            total_flag_capacity: self.config.mines,
            placed_flag_count: self.board.count_placed_flags(),
            is_first_move: self.is_first_move,
            last_revealed_by: self.last_revealed_by,
        }
    }

    /// Lay mines around the first click. Returns `Ok(false)` when the layout
    /// already exists, the game is over, or the click is off the board.
    pub fn generate_mines<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        row: usize,
        col: usize,
    ) -> Result<bool, BoardError> {
        if !self.is_first_move || self.status.is_terminal() || !self.board.in_bounds(row, col) {
            return Ok(false);
        }
        self.board.generate_mines(rng, row, col, self.config.mines)?;
        self.is_first_move = false;
        self.started_at_ms = self.now();
        Ok(true)
    }

    /// Adopt a mine layout chosen by the peer. Flags already on the board
    /// are kept. Until a cell is uncovered a newer layout replaces an older
    /// one, which covers a layout from a game the peer has since reset.
    /// Returns `Ok(false)` once anything is revealed or the game is over.
    pub fn install_mines(&mut self, mines: &[Position]) -> Result<bool, BoardError> {
        if self.status.is_terminal() || self.board.any_revealed() {
            return Ok(false);
        }
        let mut board = Board::with_mines(self.config.rows, self.config.cols, mines)?;
        for ((row, col), cell) in self.board.iter() {
            if cell.is_flagged {
                board.toggle_flag(row, col);
            }
        }
        self.board = board;
        self.is_first_move = false;
        self.started_at_ms = self.now();
        Ok(true)
    }

    /// Reveal on behalf of the current player. Ignored while mines have not
    /// been laid, after the game ended, or when nothing would be uncovered.
    pub fn reveal(&mut self, row: usize, col: usize) -> Option<MoveOutcome> {
        if self.is_first_move || self.status.is_terminal() {
            return None;
        }
        let reveal = self.board.reveal_cell(row, col);
        if reveal.is_empty() {
            return None;
        }
        let mover = self.current_player;
        let scoring = self.config.scoring;
        let delta = if reveal.hit_mine {
            -scoring.mine_penalty
        } else {
            scoring
                .per_cell
                .saturating_mul(reveal.revealed.len() as i32)
        };
        self.player_mut(mover).add_points(delta);
        self.last_revealed_by = Some(mover);
        self.current_player = mover.other();
        log::debug!(
            "player {} revealed {} cell(s) at ({}, {}){}",
            mover.number(),
            reveal.revealed.len(),
            row,
            col,
            if reveal.hit_mine { ", hit a mine" } else { "" }
        );
        if self.board.count_remaining_safe_cells() == 0 {
            self.finish();
        }
        Some(MoveOutcome::Revealed {
            cells: reveal.revealed.len(),
            hit_mine: reveal.hit_mine,
        })
    }

    /// Reveal in hot-seat play, laying mines first when needed.
    pub fn play_reveal<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        row: usize,
        col: usize,
    ) -> Result<Option<MoveOutcome>, BoardError> {
        if self.is_first_move && !self.generate_mines(rng, row, col)? {
            return Ok(None);
        }
        Ok(self.reveal(row, col))
    }

    /// Place or remove a flag for the current player. Placing scores and
    /// passes the turn; removing does neither.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Option<MoveOutcome> {
        if self.status.is_terminal() {
            return None;
        }
        match self.board.toggle_flag(row, col)? {
            true => {
                let mover = self.current_player;
                let bonus = self.config.scoring.per_flag;
                self.player_mut(mover).add_points(bonus);
                self.current_player = mover.other();
                Some(MoveOutcome::FlagPlaced)
            }
            false => Some(MoveOutcome::FlagRemoved),
        }
    }

    /// Start a new game on a fresh board. Wins carry over.
    pub fn reset(&mut self) {
        self.board = Board::new(self.config.rows, self.config.cols);
        self.player1.reset_points();
        self.player2.reset_points();
        self.current_player = PlayerId::One;
        self.status = GameStatus::Playing;
        self.is_first_move = true;
        self.last_revealed_by = None;
        self.started_at_ms = None;
    }

    /// Replace the whole game with a snapshot received from the peer.
    pub fn apply_snapshot(&mut self, state: GameState) -> Result<(), BoardError> {
        let expected = (self.config.rows, self.config.cols);
        let actual = (state.board.rows(), state.board.cols());
        if expected != actual {
            return Err(BoardError::DimensionMismatch { expected, actual });
        }
        let was_playing = !self.status.is_terminal();
        if state.is_first_move {
            self.started_at_ms = None;
        } else if self.started_at_ms.is_none() {
            self.started_at_ms = self.now();
        }
        self.board = state.board;
        self.player1 = state.player1;
        self.player2 = state.player2;
        self.current_player = state.current_player;
        self.status = state.status;
        self.is_first_move = state.is_first_move;
        self.last_revealed_by = state.last_revealed_by;
        if was_playing && self.status.is_terminal() {
            self.persist();
        }
        Ok(())
    }

    fn finish(&mut self) {
        let (p1, p2) = (self.player1.points(), self.player2.points());
        self.status = if p1 > p2 {
            self.player1.record_win();
            GameStatus::Player1Won
        } else if p2 > p1 {
            self.player2.record_win();
            GameStatus::Player2Won
        } else {
            GameStatus::Draw
        };
        log::info!("game finished: {} ({} - {})", self.status.name(), p1, p2);
        self.persist();
    }

    fn now(&self) -> Option<u64> {
        self.clock.as_ref().map(|clock| clock.now_millis())
    }

    fn persist(&mut self) {
        let record = GameRecord::from_state(self.state())
            .with_timing(self.started_at_ms, self.now());
        if let Some(store) = self.persistence.as_mut() {
            match store.save_game(record) {
                Ok(id) => log::info!("saved game record {}", id),
                Err(e) => log::warn!("failed to save game record: {}", e),
            }
        }
    }
}
