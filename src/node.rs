//! Single-writer game actor.
//!
//! All mutation of the game goes through [`GameNode::run`]: local commands
//! and transport events are taken one at a time from a `select!` loop, and
//! observers only ever see cloned [`NodeView`]s.

use rand::rngs::SmallRng;
use tokio::sync::{mpsc, watch};

use crate::game::{GameSession, GameState};
use crate::protocol::Message;
use crate::sync::{Link, Role, SyncCoordinator};
use crate::transport::session::{TransportEvent, TransportSession};

/// Input from the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reveal { row: usize, col: usize },
    ToggleFlag { row: usize, col: usize },
    Reset,
    Disconnect,
}

/// Read-only snapshot published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub state: GameState,
    pub link: Link,
    pub local_turn: bool,
    pub awaiting_ack: bool,
}

enum Input {
    Command(Option<Command>),
    Event(Option<TransportEvent>),
}

pub struct GameNode {
    game: GameSession,
    sync: SyncCoordinator,
    session: Option<TransportSession>,
    rng: SmallRng,
    view: watch::Sender<NodeView>,
}

impl GameNode {
    /// Hot-seat node with no peer.
    pub fn local(game: GameSession, rng: SmallRng) -> Self {
        Self::build(game, SyncCoordinator::local(), None, rng)
    }

    /// Node driving a session on which `listen` or `dial` was already called.
    pub fn networked(game: GameSession, session: TransportSession, role: Role, rng: SmallRng) -> Self {
        Self::build(game, SyncCoordinator::awaiting_peer(role), Some(session), rng)
    }

    fn build(
        game: GameSession,
        sync: SyncCoordinator,
        session: Option<TransportSession>,
        rng: SmallRng,
    ) -> Self {
        let view = make_view(&game, &sync);
        let (view, _) = watch::channel(view);
        Self {
            game,
            sync,
            session,
            rng,
            view,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NodeView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> NodeView {
        self.view.borrow().clone()
    }

    /// Process commands and peer traffic until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> anyhow::Result<()> {
        loop {
            let input = tokio::select! {
                cmd = commands.recv() => Input::Command(cmd),
                event = next_event(&mut self.session) => Input::Event(event),
            };
            match input {
                Input::Command(None) => {
                    self.close_link();
                    self.publish();
                    break;
                }
                Input::Command(Some(cmd)) => self.handle_command(cmd).await,
                Input::Event(Some(event)) => self.handle_event(event).await,
                Input::Event(None) => {
                    self.session = None;
                    if matches!(self.sync.link(), Link::Pending(_) | Link::Peer(_)) {
                        self.sync.disconnected();
                    }
                }
            }
            self.publish();
        }
        Ok(())
    }

    async fn handle_command(&mut self, cmd: Command) {
        let outbound = match cmd {
            Command::Reveal { row, col } => {
                self.sync
                    .local_reveal(&mut self.game, &mut self.rng, row, col)
            }
            Command::ToggleFlag { row, col } => self.sync.local_flag(&mut self.game, row, col),
            Command::Reset => self.sync.local_reset(&mut self.game),
            Command::Disconnect => {
                self.close_link();
                Vec::new()
            }
        };
        self.dispatch(outbound).await;
    }

    async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(role) => {
                let outbound = self.sync.connected(role, &mut self.game);
                self.dispatch(outbound).await;
            }
            TransportEvent::Message(msg) => {
                let outbound = self.sync.on_message(&mut self.game, msg);
                self.dispatch(outbound).await;
            }
            TransportEvent::Disconnected(reason) => {
                match reason {
                    Some(e) => log::warn!("peer link failed: {}", e),
                    None => log::info!("peer closed the link"),
                }
                self.sync.disconnected();
            }
        }
    }

    async fn dispatch(&mut self, outbound: Vec<Message>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for msg in outbound {
            if let Err(e) = session.send(msg).await {
                log::warn!("failed to reach peer: {}", e);
                break;
            }
        }
    }

    fn close_link(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect();
        }
        self.sync.disconnected();
    }

    fn publish(&self) {
        self.view.send_replace(make_view(&self.game, &self.sync));
    }
}

fn make_view(game: &GameSession, sync: &SyncCoordinator) -> NodeView {
    NodeView {
        state: game.state(),
        link: sync.link(),
        local_turn: !game.status().is_terminal() && sync.is_local_turn(game),
        awaiting_ack: sync.awaiting_ack(),
    }
}

async fn next_event(session: &mut Option<TransportSession>) -> Option<TransportEvent> {
    match session {
        Some(session) => session.recv().await,
        None => std::future::pending().await,
    }
}
