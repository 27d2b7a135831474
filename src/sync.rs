//! Peer synchronization: turn arbitration, first-move mine distribution
//! and whole-state reconciliation.
//!
//! The coordinator performs no I/O. Each operation mutates the local
//! [`GameSession`] and returns the messages the caller must send to the
//! peer, in order.

use alloc::vec;
use alloc::vec::Vec;
use rand::Rng;

use crate::common::Position;
use crate::game::GameSession;
use crate::player::PlayerId;
use crate::protocol::Message;

/// Side of a peer link. The listener hosts and plays first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn player(self) -> PlayerId {
        match self {
            Role::Host => PlayerId::One,
            Role::Guest => PlayerId::Two,
        }
    }
}

/// How the local game is attached to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Hot-seat play on one device.
    Local,
    /// Waiting for the connection to come up.
    Pending(Role),
    Peer(Role),
    /// The peer went away. The board stays visible but takes no input.
    Closed(Role),
}

#[derive(Debug)]
pub struct SyncCoordinator {
    link: Link,
    board_synced: bool,
    pending_reveal: Option<Position>,
}

impl SyncCoordinator {
    pub fn local() -> Self {
        Self::with_link(Link::Local)
    }

    pub fn awaiting_peer(role: Role) -> Self {
        Self::with_link(Link::Pending(role))
    }

    fn with_link(link: Link) -> Self {
        Self {
            link,
            board_synced: false,
            pending_reveal: None,
        }
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn role(&self) -> Option<Role> {
        match self.link {
            Link::Local => None,
            Link::Pending(role) | Link::Peer(role) | Link::Closed(role) => Some(role),
        }
    }

    /// Whether the mine layout for the current game has been exchanged.
    pub fn board_synced(&self) -> bool {
        self.board_synced
    }

    /// Host sent `BOARD_SYNC` and holds its first reveal until the guest
    /// acknowledges.
    pub fn awaiting_ack(&self) -> bool {
        self.pending_reveal.is_some()
    }

    /// Connection established. Both sides start from a fresh game and
    /// announce the name of their own player.
    pub fn connected(&mut self, role: Role, game: &mut GameSession) -> Vec<Message> {
        self.link = Link::Peer(role);
        self.clear_game_flags();
        game.reset();
        log::info!("connected as {:?}, playing as player {}", role, role.player().number());
        vec![Message::PlayerName(game.player(role.player()).name().into())]
    }

    pub fn disconnected(&mut self) {
        if let Some(role) = self.role() {
            self.link = Link::Closed(role);
        }
        self.pending_reveal = None;
    }

    /// Local input is accepted only on the local player's turn.
    pub fn is_local_turn(&self, game: &GameSession) -> bool {
        match self.link {
            Link::Local => true,
            Link::Peer(role) => game.current_player() == role.player(),
            Link::Pending(_) | Link::Closed(_) => false,
        }
    }

    fn accepts_input(&self, game: &GameSession) -> bool {
        !game.status().is_terminal() && self.pending_reveal.is_none() && self.is_local_turn(game)
    }

    pub fn local_reveal<R: Rng + ?Sized>(
        &mut self,
        game: &mut GameSession,
        rng: &mut R,
        row: usize,
        col: usize,
    ) -> Vec<Message> {
        if !self.accepts_input(game) {
            return Vec::new();
        }
        let role = match self.link {
            Link::Peer(role) => role,
            _ => {
                if let Err(e) = game.play_reveal(rng, row, col) {
                    log::warn!("cannot start game: {}", e);
                }
                return Vec::new();
            }
        };

        if game.is_first_move() {
            match role {
                Role::Host => return self.open_game(game, rng, row, col),
                Role::Guest if !self.board_synced => {
                    log::debug!("ignoring reveal before the mine layout arrived");
                    return Vec::new();
                }
                Role::Guest => {}
            }
        }
        match game.reveal(row, col) {
            Some(_) => vec![Message::GameStateUpdate(game.state())],
            None => Vec::new(),
        }
    }

    /// Host's first reveal: lay mines, ship the layout, and defer the reveal
    /// until the guest acknowledges it.
    fn open_game<R: Rng + ?Sized>(
        &mut self,
        game: &mut GameSession,
        rng: &mut R,
        row: usize,
        col: usize,
    ) -> Vec<Message> {
        match game.generate_mines(rng, row, col) {
            Ok(true) => {
                self.board_synced = true;
                self.pending_reveal = Some((row, col));
                log::debug!("sending mine layout, first reveal at ({}, {})", row, col);
                vec![Message::BoardSync(game.board().mine_positions())]
            }
            Ok(false) => Vec::new(),
            Err(e) => {
                log::warn!("cannot start game: {}", e);
                Vec::new()
            }
        }
    }

    pub fn local_flag(&mut self, game: &mut GameSession, row: usize, col: usize) -> Vec<Message> {
        if !self.accepts_input(game) {
            return Vec::new();
        }
        match (game.toggle_flag(row, col), self.link) {
            (Some(_), Link::Peer(_)) => vec![Message::GameStateUpdate(game.state())],
            _ => Vec::new(),
        }
    }

    /// Start a new game locally, asking a connected peer to do the same.
    pub fn local_reset(&mut self, game: &mut GameSession) -> Vec<Message> {
        self.clear_game_flags();
        game.reset();
        match self.link {
            Link::Peer(_) => vec![Message::ResetGame],
            _ => Vec::new(),
        }
    }

    /// Fold a peer message into the local game. Rejected messages leave the
    /// game untouched.
    pub fn on_message(&mut self, game: &mut GameSession, msg: Message) -> Vec<Message> {
        let Link::Peer(role) = self.link else {
            log::debug!("dropping {:?} without an active peer", msg.message_type());
            return Vec::new();
        };
        match msg {
            Message::BoardSync(mines) => {
                if role != Role::Guest {
                    log::warn!("host received a mine layout; ignoring");
                    return Vec::new();
                }
                match game.install_mines(&mines) {
                    Ok(true) => {
                        self.board_synced = true;
                        log::debug!("installed {} mines from host", game.board().mine_count());
                        vec![Message::BoardSyncAck]
                    }
                    Ok(false) => {
                        log::warn!("mine layout arrived after the first reveal; ignoring");
                        Vec::new()
                    }
                    Err(e) => {
                        log::warn!("rejected mine layout: {}", e);
                        Vec::new()
                    }
                }
            }
            Message::BoardSyncAck => {
                let Some((row, col)) = self.pending_reveal.take() else {
                    log::warn!("unexpected mine layout acknowledgement");
                    return Vec::new();
                };
                match game.reveal(row, col) {
                    Some(_) => vec![Message::GameStateUpdate(game.state())],
                    None => Vec::new(),
                }
            }
            Message::GameStateUpdate(mut state) => {
                // Each side owns the name of its own player.
                let local = role.player();
                state.player_mut(local).rename(game.player(local).name());
                if let Err(e) = game.apply_snapshot(state) {
                    log::warn!("rejected peer snapshot: {}", e);
                    return Vec::new();
                }
                if role == Role::Guest && !game.is_first_move() {
                    self.board_synced = true;
                }
                Vec::new()
            }
            Message::ResetGame => {
                log::info!("peer started a new game");
                self.clear_game_flags();
                game.reset();
                Vec::new()
            }
            Message::PlayerName(name) => {
                let peer = role.player().other();
                game.rename_player(peer, &name);
                log::info!("player {} is {}", peer.number(), game.player(peer).name());
                Vec::new()
            }
        }
    }

    fn clear_game_flags(&mut self) {
        self.board_synced = false;
        self.pending_reveal = None;
    }
}
