//! Wire messages exchanged between peers, framed as `TYPE|PAYLOAD\n`.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::common::{BoardError, Position};
use crate::game::GameState;
use crate::snapshot;

/// Separates the message type from its payload.
pub const FIELD_SEPARATOR: char = '|';
/// Terminates every frame.
pub const FRAME_TERMINATOR: char = '\n';

/// Message kinds understood on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    BoardSync,
    BoardSyncAck,
    GameStateUpdate,
    ResetGame,
    PlayerName,
}

impl MessageType {
    pub fn name(self) -> &'static str {
        match self {
            MessageType::BoardSync => "BOARD_SYNC",
            MessageType::BoardSyncAck => "BOARD_SYNC_ACK",
            MessageType::GameStateUpdate => "GAME_STATE_UPDATE",
            MessageType::ResetGame => "RESET_GAME",
            MessageType::PlayerName => "PLAYER_NAME",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "BOARD_SYNC" => Some(MessageType::BoardSync),
            "BOARD_SYNC_ACK" => Some(MessageType::BoardSyncAck),
            "GAME_STATE_UPDATE" => Some(MessageType::GameStateUpdate),
            "RESET_GAME" => Some(MessageType::ResetGame),
            "PLAYER_NAME" => Some(MessageType::PlayerName),
            _ => None,
        }
    }
}

/// Decoded peer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Authoritative mine layout for the current game (host to guest).
    BoardSync(Vec<Position>),
    /// Guest has installed the mine layout.
    BoardSyncAck,
    /// Whole-state replacement.
    GameStateUpdate(GameState),
    /// Start a new game.
    ResetGame,
    /// Name of the sender's own player, sent once the link is up.
    PlayerName(String),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::BoardSync(_) => MessageType::BoardSync,
            Message::BoardSyncAck => MessageType::BoardSyncAck,
            Message::GameStateUpdate(_) => MessageType::GameStateUpdate,
            Message::ResetGame => MessageType::ResetGame,
            Message::PlayerName(_) => MessageType::PlayerName,
        }
    }

    /// Encode as one frame, terminator included.
    pub fn encode_frame(&self) -> String {
        let payload = match self {
            Message::BoardSync(mines) => snapshot::encode_mines(mines),
            Message::GameStateUpdate(state) => snapshot::encode_state(state),
            Message::PlayerName(name) => name.replace(['\n', '\r'], "_"),
            Message::BoardSyncAck | Message::ResetGame => String::new(),
        };
        let mut frame = String::with_capacity(payload.len() + 24);
        frame.push_str(self.message_type().name());
        frame.push(FIELD_SEPARATOR);
        frame.push_str(&payload);
        frame.push(FRAME_TERMINATOR);
        frame
    }

    /// Decode one frame. The terminator and a trailing `\r` are optional.
    pub fn decode_frame(frame: &str) -> Result<Self, ProtocolError> {
        let line = frame
            .strip_suffix(FRAME_TERMINATOR)
            .unwrap_or(frame)
            .trim_end_matches('\r');
        let (kind, payload) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or(ProtocolError::MissingSeparator)?;
        let kind = MessageType::parse(kind).ok_or_else(|| ProtocolError::UnknownType(kind.into()))?;
        match kind {
            MessageType::BoardSync => Ok(Message::BoardSync(snapshot::decode_mines(payload)?)),
            MessageType::BoardSyncAck => Ok(Message::BoardSyncAck),
            MessageType::GameStateUpdate => {
                Ok(Message::GameStateUpdate(snapshot::decode_state(payload)?))
            }
            MessageType::ResetGame => Ok(Message::ResetGame),
            MessageType::PlayerName => Ok(Message::PlayerName(payload.into())),
        }
    }
}

/// Errors raised while decoding frames and snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame has no `|` between type and payload.
    MissingSeparator,
    UnknownType(String),
    FieldCount { expected: usize, actual: usize },
    InvalidNumber(String),
    InvalidFlag(String),
    InvalidStatus(String),
    InvalidPlayer(String),
    InvalidCell(String),
    /// Rows of differing length or an oversized grid.
    MalformedBoard,
    InvalidBoard(BoardError),
    /// A counter disagrees with a recount of the board.
    CountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl From<BoardError> for ProtocolError {
    fn from(err: BoardError) -> Self {
        ProtocolError::InvalidBoard(err)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MissingSeparator => write!(f, "Frame has no type separator"),
            ProtocolError::UnknownType(t) => write!(f, "Unknown message type '{}'", t),
            ProtocolError::FieldCount { expected, actual } => {
                write!(f, "Expected {} fields, got {}", expected, actual)
            }
            ProtocolError::InvalidNumber(s) => write!(f, "Invalid number '{}'", s),
            ProtocolError::InvalidFlag(s) => write!(f, "Invalid boolean '{}', expected 0 or 1", s),
            ProtocolError::InvalidStatus(s) => write!(f, "Unknown game status '{}'", s),
            ProtocolError::InvalidPlayer(s) => write!(f, "Invalid player '{}'", s),
            ProtocolError::InvalidCell(s) => write!(f, "Invalid cell '{}'", s),
            ProtocolError::MalformedBoard => write!(f, "Board is not a valid rectangle"),
            ProtocolError::InvalidBoard(e) => write!(f, "Invalid board: {}", e),
            ProtocolError::CountMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Field {} is {}, board recount gives {}",
                field, actual, expected
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}
