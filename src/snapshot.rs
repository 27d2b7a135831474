//! Text encoding of game snapshots and mine layouts.
//!
//! A snapshot is ten `#`-separated fields in fixed order:
//!
//! ```text
//! board # player1 # player2 # current # status # remaining # capacity # placed # first_move # last_revealed_by
//! ```
//!
//! The board is rows joined by `;`, each row cells joined by `/`, each cell
//! `mine,revealed,flagged,adjacent` with booleans as `0`/`1`. Players are
//! `name:points:wins`. `last_revealed_by` is `1`, `2` or `null`. None of
//! these delimiters can appear in a player name, and none is the frame
//! separator `|`.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str::FromStr;

use crate::board::Board;
use crate::cell::Cell;
use crate::common::Position;
use crate::config::MAX_BOARD_SIDE;
use crate::game::{GameState, GameStatus};
use crate::player::{Player, PlayerId};
use crate::protocol::ProtocolError;

const FIELD_SEP: char = '#';
const ROW_SEP: char = ';';
const CELL_SEP: char = '/';
const CELL_FIELD_SEP: char = ',';
const PLAYER_SEP: char = ':';
const SNAPSHOT_FIELDS: usize = 10;

/// Encode a snapshot payload.
pub fn encode_state(state: &GameState) -> String {
    let board = &state.board;
    let mut rows = Vec::with_capacity(board.rows());
    for row in board.cells().chunks(board.cols().max(1)) {
        let cells: Vec<String> = row.iter().map(encode_cell).collect();
        rows.push(cells.join(&CELL_SEP.to_string()));
    }
    let fields = [
        rows.join(&ROW_SEP.to_string()),
        encode_player(&state.player1),
        encode_player(&state.player2),
        state.current_player.number().to_string(),
        state.status.name().to_string(),
        state.remaining_safe_cells.to_string(),
        state.total_flag_capacity.to_string(),
        state.placed_flag_count.to_string(),
        bit(state.is_first_move).to_string(),
        match state.last_revealed_by {
            Some(id) => id.number().to_string(),
            None => "null".to_string(),
        },
    ];
    fields.join(&FIELD_SEP.to_string())
}

/// Decode and validate a snapshot payload. Counters must agree with the
/// board they describe.
pub fn decode_state(payload: &str) -> Result<GameState, ProtocolError> {
    let fields: Vec<&str> = payload.split(FIELD_SEP).collect();
    if fields.len() != SNAPSHOT_FIELDS {
        return Err(ProtocolError::FieldCount {
            expected: SNAPSHOT_FIELDS,
            actual: fields.len(),
        });
    }

    let board = decode_board(fields[0])?;
    let player1 = decode_player(PlayerId::One, fields[1])?;
    let player2 = decode_player(PlayerId::Two, fields[2])?;
    let current_player = decode_player_id(fields[3])?;
    let status =
        GameStatus::parse(fields[4]).ok_or_else(|| ProtocolError::InvalidStatus(fields[4].into()))?;
    let remaining_safe_cells: usize = number(fields[5])?;
    let total_flag_capacity: usize = number(fields[6])?;
    let placed_flag_count: usize = number(fields[7])?;
    let is_first_move = flag(fields[8])?;
    let last_revealed_by = match fields[9] {
        "null" => None,
        other => Some(decode_player_id(other)?),
    };

    check_count(
        "remaining_safe_cells",
        board.count_remaining_safe_cells(),
        remaining_safe_cells,
    )?;
    check_count("placed_flag_count", board.count_placed_flags(), placed_flag_count)?;

    Ok(GameState {
        board,
        player1,
        player2,
        current_player,
        status,
        remaining_safe_cells,
        total_flag_capacity,
        placed_flag_count,
        is_first_move,
        last_revealed_by,
    })
}

/// Encode mine coordinates as `r1,c1;r2,c2;...`.
pub fn encode_mines(mines: &[Position]) -> String {
    let pairs: Vec<String> = mines.iter().map(|(r, c)| format!("{},{}", r, c)).collect();
    pairs.join(&ROW_SEP.to_string())
}

/// Decode mine coordinates. An empty payload is an empty layout.
pub fn decode_mines(payload: &str) -> Result<Vec<Position>, ProtocolError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    payload
        .split(ROW_SEP)
        .map(|pair| {
            let (r, c) = pair
                .split_once(CELL_FIELD_SEP)
                .ok_or_else(|| ProtocolError::InvalidCell(pair.into()))?;
            Ok((number(r)?, number(c)?))
        })
        .collect()
}

fn encode_cell(cell: &Cell) -> String {
    format!(
        "{},{},{},{}",
        bit(cell.is_mine),
        bit(cell.is_revealed),
        bit(cell.is_flagged),
        cell.adjacent_mines
    )
}

fn decode_cell(text: &str) -> Result<Cell, ProtocolError> {
    let parts: Vec<&str> = text.split(CELL_FIELD_SEP).collect();
    let [mine, revealed, flagged, adjacent] = parts[..] else {
        return Err(ProtocolError::InvalidCell(text.into()));
    };
    let adjacent_mines: u8 = number(adjacent)?;
    if adjacent_mines > 8 {
        return Err(ProtocolError::InvalidCell(text.into()));
    }
    Ok(Cell {
        is_mine: flag(mine)?,
        is_revealed: flag(revealed)?,
        is_flagged: flag(flagged)?,
        adjacent_mines,
    })
}

fn decode_board(text: &str) -> Result<Board, ProtocolError> {
    let rows: Vec<&str> = text.split(ROW_SEP).collect();
    if rows.len() > MAX_BOARD_SIDE {
        return Err(ProtocolError::MalformedBoard);
    }
    let mut cols = None;
    let mut cells = Vec::new();
    for row in &rows {
        let row_cells: Vec<&str> = row.split(CELL_SEP).collect();
        if row_cells.len() > MAX_BOARD_SIDE || *cols.get_or_insert(row_cells.len()) != row_cells.len() {
            return Err(ProtocolError::MalformedBoard);
        }
        for cell in row_cells {
            cells.push(decode_cell(cell)?);
        }
    }
    let cols = cols.ok_or(ProtocolError::MalformedBoard)?;
    Ok(Board::from_cells(rows.len(), cols, cells)?)
}

fn encode_player(player: &Player) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        player.name(),
        player.points(),
        player.wins(),
        sep = PLAYER_SEP
    )
}

fn decode_player(id: PlayerId, text: &str) -> Result<Player, ProtocolError> {
    let parts: Vec<&str> = text.split(PLAYER_SEP).collect();
    let [name, points, wins] = parts[..] else {
        return Err(ProtocolError::InvalidPlayer(text.into()));
    };
    Ok(Player::restore(id, name, number(points)?, number(wins)?))
}

fn decode_player_id(text: &str) -> Result<PlayerId, ProtocolError> {
    number::<u8>(text)
        .ok()
        .and_then(PlayerId::from_number)
        .ok_or_else(|| ProtocolError::InvalidPlayer(text.into()))
}

fn check_count(field: &'static str, expected: usize, actual: usize) -> Result<(), ProtocolError> {
    if expected != actual {
        return Err(ProtocolError::CountMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn number<T: FromStr>(text: &str) -> Result<T, ProtocolError> {
    text.parse()
        .map_err(|_| ProtocolError::InvalidNumber(text.into()))
}

fn flag(text: &str) -> Result<bool, ProtocolError> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ProtocolError::InvalidFlag(other.into())),
    }
}

fn bit(value: bool) -> u8 {
    value as u8
}
