use std::sync::Mutex;

use tokio::io::{duplex, DuplexStream};
use tokio::sync::oneshot;

use crate::transport::framed::FramedTransport;
use crate::transport::ConnectionProvider;

/// Buffer size of each direction of an in-process stream.
const PIPE_CAPACITY: usize = 64 * 1024;

pub type InMemoryTransport = FramedTransport<DuplexStream>;

/// Two framed transports joined back to back.
pub fn transport_pair() -> (InMemoryTransport, InMemoryTransport) {
    let (a, b) = duplex(PIPE_CAPACITY);
    (FramedTransport::new(a), FramedTransport::new(b))
}

/// In-process connection provider. `pair` returns a host side that can
/// `listen` once and a guest side that can `dial` once.
pub struct MemoryProvider {
    incoming: Mutex<Option<oneshot::Receiver<DuplexStream>>>,
    outgoing: Mutex<Option<oneshot::Sender<DuplexStream>>>,
}

impl MemoryProvider {
    pub fn pair() -> (Self, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                incoming: Mutex::new(Some(rx)),
                outgoing: Mutex::new(None),
            },
            Self {
                incoming: Mutex::new(None),
                outgoing: Mutex::new(Some(tx)),
            },
        )
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for MemoryProvider {
    type Stream = DuplexStream;

    async fn listen(&self) -> anyhow::Result<DuplexStream> {
        let incoming = {
            let mut slot = self
                .incoming
                .lock()
                .map_err(|_| anyhow::anyhow!("Provider lock poisoned"))?;
            slot.take()
        };
        let incoming = incoming.ok_or_else(|| anyhow::anyhow!("Provider cannot listen"))?;
        incoming
            .await
            .map_err(|_| anyhow::anyhow!("Peer provider dropped before dialing"))
    }

    async fn dial(&self, _peer: &str) -> anyhow::Result<DuplexStream> {
        let outgoing = {
            let mut slot = self
                .outgoing
                .lock()
                .map_err(|_| anyhow::anyhow!("Provider lock poisoned"))?;
            slot.take()
        };
        let outgoing = outgoing.ok_or_else(|| anyhow::anyhow!("Provider cannot dial"))?;
        let (local, remote) = duplex(PIPE_CAPACITY);
        outgoing
            .send(remote)
            .map_err(|_| anyhow::anyhow!("No peer is listening"))?;
        Ok(local)
    }
}
