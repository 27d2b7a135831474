//! Line-oriented terminal front-end: input parsing and board rendering.

use std::fmt::Write;

use crate::board::Board;
use crate::common::Position;
use crate::game::GameStatus;
use crate::node::NodeView;
use crate::player::PlayerId;
use crate::sync::Link;

pub const HELP: &str = "\
Commands:
  r A5     reveal column A, row 5
  f A5     place or remove a flag
  reset    start a new game (wins are kept)
  quit     leave the game
  help     show this message";

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Reveal(Position),
    Flag(Position),
    Reset,
    Quit,
    Help,
}

pub fn coord_to_string(row: usize, col: usize) -> String {
    let letter = (b'A' + col as u8) as char;
    format!("{}{}", letter, row + 1)
}

/// Parse `A5`-style coordinates: column letter then 1-based row.
pub fn parse_coord(input: &str, rows: usize, cols: usize) -> Result<Position, String> {
    let input = input.trim();
    if input.len() < 2 {
        return Err("Too short - need column letter and row number (e.g., A5)".to_string());
    }
    let mut chars = input.chars();
    let col_ch = chars.next().ok_or("No column letter")?.to_ascii_uppercase();
    let last_col = (b'A' + cols.saturating_sub(1) as u8) as char;
    if !col_ch.is_ascii_uppercase() {
        return Err(format!("Invalid column '{}' - must be a letter A-{}", col_ch, last_col));
    }
    let col = (col_ch as u8 - b'A') as usize;
    if col >= cols {
        return Err(format!("Column '{}' out of bounds - must be A-{}", col_ch, last_col));
    }
    let row_str: String = chars.collect();
    let row: usize = row_str
        .parse()
        .map_err(|_| format!("Invalid row '{}' - must be a number 1-{}", row_str, rows))?;
    if row == 0 || row > rows {
        return Err(format!("Row {} out of bounds - must be 1-{}", row, rows));
    }
    Ok((row - 1, col))
}

pub fn parse_input(line: &str, rows: usize, cols: usize) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or("Empty input")?.to_ascii_lowercase();
    let arg = parts.next();
    if parts.next().is_some() {
        return Err("Too many arguments - type 'help'".to_string());
    }
    match (verb.as_str(), arg) {
        ("r" | "reveal", Some(coord)) => Ok(Input::Reveal(parse_coord(coord, rows, cols)?)),
        ("f" | "flag", Some(coord)) => Ok(Input::Flag(parse_coord(coord, rows, cols)?)),
        ("r" | "reveal" | "f" | "flag", None) => Err("Missing coordinate (e.g., r A5)".to_string()),
        ("reset", None) => Ok(Input::Reset),
        ("q" | "quit" | "exit", None) => Ok(Input::Quit),
        ("h" | "help" | "?", None) => Ok(Input::Help),
        _ => Err(format!("Unknown command '{}' - type 'help'", line.trim())),
    }
}

fn cell_glyph(board: &Board, row: usize, col: usize) -> char {
    match board.cell(row, col) {
        Some(cell) if cell.is_revealed && cell.is_mine => '*',
        Some(cell) if cell.is_revealed && cell.adjacent_mines == 0 => '.',
        Some(cell) if cell.is_revealed => (b'0' + cell.adjacent_mines) as char,
        Some(cell) if cell.is_flagged => 'F',
        _ => '#',
    }
}

/// Plain text grid with column letters and row numbers.
pub fn render_board(board: &Board) -> String {
    let mut out = String::from("    ");
    for c in 0..board.cols() {
        out.push(' ');
        out.push((b'A' + c as u8) as char);
    }
    out.push('\n');
    for r in 0..board.rows() {
        let _ = write!(out, "  {:2}", r + 1);
        for c in 0..board.cols() {
            out.push(' ');
            out.push(cell_glyph(board, r, c));
        }
        out.push('\n');
    }
    out
}

fn link_label(link: Link) -> String {
    match link {
        Link::Local => "hot-seat".to_string(),
        Link::Pending(role) => format!("waiting for peer ({:?})", role),
        Link::Peer(role) => format!("connected as {:?}", role),
        Link::Closed(role) => format!("peer left ({:?})", role),
    }
}

/// Board, scores and whose turn it is. Mines are shown once the game ends.
pub fn render_view(view: &NodeView) -> String {
    let state = &view.state;
    let mut board = state.board.clone();
    if state.status.is_terminal() {
        board.reveal_all_mines();
    }
    let mut out = render_board(&board);
    for id in [PlayerId::One, PlayerId::Two] {
        let player = state.player(id);
        let _ = writeln!(
            out,
            "  P{} {:<16} {:>5} pts  {} wins",
            id.number(),
            player.name(),
            player.points(),
            player.wins()
        );
    }
    let _ = writeln!(
        out,
        "  safe cells left: {}  flags: {}/{}  [{}]",
        state.remaining_safe_cells,
        state.placed_flag_count,
        state.total_flag_capacity,
        link_label(view.link)
    );
    let status = match state.status {
        GameStatus::Playing if view.awaiting_ack => "Waiting for the peer to receive the board...".to_string(),
        GameStatus::Playing if view.local_turn => {
            format!("Player {} to move", state.current_player.number())
        }
        GameStatus::Playing => format!("Waiting for player {}", state.current_player.number()),
        GameStatus::Draw => "Game over: draw".to_string(),
        other => match other.winner() {
            Some(id) => format!("Game over: {} wins", state.player(id).name()),
            None => "Game over".to_string(),
        },
    };
    out.push_str("  ");
    out.push_str(&status);
    out.push('\n');
    out
}
