use alloc::format;
use alloc::string::String;

/// Seat at the table. Player one moves first and is the host on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(PlayerId::One),
            2 => Some(PlayerId::Two),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

/// Characters reserved by the snapshot encoding.
const RESERVED: [char; 8] = ['#', '|', ':', ';', ',', '/', '\n', '\r'];

/// Replace characters the wire format reserves and fall back to a default
/// name when nothing printable is left.
pub fn sanitize_name(id: PlayerId, name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|ch| if RESERVED.contains(&ch) || ch.is_control() { '_' } else { ch })
        .collect();
    if cleaned.is_empty() {
        format!("Player {}", id.number())
    } else {
        cleaned
    }
}

/// Score card for one participant. Points reset every game, wins persist
/// for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    id: PlayerId,
    name: String,
    points: i32,
    wins: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self::restore(id, name, 0, 0)
    }

    /// Rebuild a player from stored or received values.
    pub fn restore(id: PlayerId, name: &str, points: i32, wins: u32) -> Self {
        Self {
            id,
            name: sanitize_name(id, name),
            points,
            wins,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.name = sanitize_name(self.id, name);
    }

    pub(crate) fn add_points(&mut self, delta: i32) {
        self.points = self.points.saturating_add(delta);
    }

    pub(crate) fn record_win(&mut self) {
        self.wins = self.wins.saturating_add(1);
    }

    pub(crate) fn reset_points(&mut self) {
        self.points = 0;
    }
}
