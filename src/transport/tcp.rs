use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::ConnectionProvider;

/// Default timeout for dialing a peer (30 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP connection provider. A bound provider can listen; any provider can
/// dial.
pub struct TcpProvider {
    listener: Option<TcpListener>,
    connect_timeout: Duration,
}

impl TcpProvider {
    /// Bind a listening socket for the host side.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener: Some(listener),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Provider for the guest side.
    pub fn dialer() -> Self {
        Self {
            listener: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Provider is not bound"))?;
        Ok(listener.local_addr()?)
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for TcpProvider {
    type Stream = TcpStream;

    async fn listen(&self) -> anyhow::Result<TcpStream> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Provider is not bound to a local address"))?;
        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;
        log::info!("accepted peer from {}", addr);
        Ok(stream)
    }

    async fn dial(&self, peer: &str) -> anyhow::Result<TcpStream> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(peer))
            .await
            .map_err(|_| anyhow::anyhow!("Connect timeout after {:?}", self.connect_timeout))??;
        stream.set_nodelay(true)?;
        log::info!("connected to {}", peer);
        Ok(stream)
    }
}
