//! Connection lifecycle around a [`ConnectionProvider`].
//!
//! A session owns one background task per connection attempt. The task
//! accepts or dials, then shuttles frames between the stream and two
//! channels until either side closes. Aborting the task cancels a pending
//! accept, dial or read.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::protocol::Message;
use crate::sync::Role;
use crate::transport::framed::FramedTransport;
use crate::transport::{ConnectionProvider, Transport};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Listening,
    Connecting,
    Connected,
}

/// Connectivity and inbound traffic, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected(Role),
    Message(Message),
    /// The link ended. Carries the failure when it was not a clean close.
    Disconnected(Option<String>),
}

pub struct TransportSession {
    state: Arc<watch::Sender<ConnectionState>>,
    role: Option<Role>,
    outbound: Option<mpsc::Sender<Message>>,
    events: Option<mpsc::Receiver<TransportEvent>>,
    task: Option<JoinHandle<()>>,
}

impl Default for TransportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportSession {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state: Arc::new(state),
            role: None,
            outbound: None,
            events: None,
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Wait for a peer as host. Must be called inside a Tokio runtime.
    pub fn listen<P: ConnectionProvider>(&mut self, provider: P) -> anyhow::Result<()> {
        self.start(provider, Role::Host, None)
    }

    /// Connect to `peer` as guest. Must be called inside a Tokio runtime.
    pub fn dial<P: ConnectionProvider>(&mut self, provider: P, peer: &str) -> anyhow::Result<()> {
        self.start(provider, Role::Guest, Some(peer.to_string()))
    }

    fn start<P: ConnectionProvider>(
        &mut self,
        provider: P,
        role: Role,
        peer: Option<String>,
    ) -> anyhow::Result<()> {
        let current = self.state();
        if current != ConnectionState::Disconnected {
            return Err(anyhow::anyhow!("Session is already {:?}", current));
        }
        self.shutdown_task();
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (ev_tx, ev_rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.state.send_replace(match role {
            Role::Host => ConnectionState::Listening,
            Role::Guest => ConnectionState::Connecting,
        });
        self.role = Some(role);
        self.outbound = Some(out_tx);
        self.events = Some(ev_rx);
        self.task = Some(tokio::spawn(run_connection(
            provider,
            role,
            peer,
            self.state.clone(),
            out_rx,
            ev_tx,
        )));
        Ok(())
    }

    /// Queue a message for the peer. Fails when not connected.
    pub async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        if self.state() != ConnectionState::Connected {
            return Err(anyhow::anyhow!("Cannot send {}: not connected", msg.message_type().name()));
        }
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Cannot send: not connected"))?;
        if outbound.send(msg).await.is_err() {
            self.state.send_replace(ConnectionState::Disconnected);
            return Err(anyhow::anyhow!("Connection closed"));
        }
        Ok(())
    }

    /// Next event from the link. Returns `None` once the link is gone and
    /// every pending event has been delivered.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    /// Drop the connection or cancel a pending accept/dial. Safe to call
    /// any number of times.
    pub fn disconnect(&mut self) {
        self.shutdown_task();
        self.outbound = None;
        self.events = None;
        self.role = None;
        if self.state.send_replace(ConnectionState::Disconnected) != ConnectionState::Disconnected {
            log::info!("transport session disconnected");
        }
    }

    fn shutdown_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.shutdown_task();
    }
}

async fn run_connection<P: ConnectionProvider>(
    provider: P,
    role: Role,
    peer: Option<String>,
    state: Arc<watch::Sender<ConnectionState>>,
    mut outbound: mpsc::Receiver<Message>,
    events: mpsc::Sender<TransportEvent>,
) {
    let stream = match (role, peer) {
        (Role::Guest, Some(peer)) => provider.dial(&peer).await,
        _ => provider.listen().await,
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("connection attempt failed: {}", e);
            state.send_replace(ConnectionState::Disconnected);
            let _ = events.send(TransportEvent::Disconnected(Some(e.to_string()))).await;
            return;
        }
    };

    let mut transport = FramedTransport::new(stream);
    state.send_replace(ConnectionState::Connected);
    if events.send(TransportEvent::Connected(role)).await.is_err() {
        return;
    }

    let reason = loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(msg) => {
                    if let Err(e) = transport.send(&msg).await {
                        break Some(e.to_string());
                    }
                }
                None => {
                    let _ = transport.close().await;
                    break None;
                }
            },
            received = transport.recv() => match received {
                Ok(Some(msg)) => {
                    if events.send(TransportEvent::Message(msg)).await.is_err() {
                        break None;
                    }
                }
                Ok(None) => break None,
                Err(e) => break Some(e.to_string()),
            },
        }
    };

    match &reason {
        Some(e) => log::warn!("connection lost: {}", e),
        None => log::info!("connection closed"),
    }
    state.send_replace(ConnectionState::Disconnected);
    let _ = events.send(TransportEvent::Disconnected(reason)).await;
}
