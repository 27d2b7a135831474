use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::Message;

/// Message channel over an established byte stream.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()>;
    /// Next decoded message, or `None` once the peer closed the stream.
    async fn recv(&mut self) -> anyhow::Result<Option<Message>>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Yields an ordered, reliable byte stream to the peer. Discovery and
/// pairing happen behind this trait.
#[async_trait::async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for one incoming peer.
    async fn listen(&self) -> anyhow::Result<Self::Stream>;
    /// Connect to `peer`.
    async fn dial(&self, peer: &str) -> anyhow::Result<Self::Stream>;
}

pub mod framed;
pub mod in_memory;
pub mod session;
pub mod tcp;
