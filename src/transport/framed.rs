use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};

use crate::protocol::{Message, FRAME_TERMINATOR};
use crate::transport::Transport;

/// Default timeout for writing one frame (10 seconds).
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest frame accepted from the peer (64 KiB). A 26x26 snapshot is well
/// under this.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;

/// Newline-delimited frames over any byte stream.
///
/// `recv` is cancel-safe: bytes are only moved into the internal buffer
/// after a read completes, so a dropped `recv` future loses nothing.
pub struct FramedTransport<S> {
    stream: S,
    buffer: Vec<u8>,
    send_timeout: Duration,
    max_frame_size: usize,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, DEFAULT_SEND_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(stream: S, send_timeout: Duration, max_frame_size: usize) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(READ_CHUNK),
            send_timeout,
            max_frame_size,
        }
    }

    /// Pop the next complete frame, skipping blank and malformed ones.
    fn next_buffered(&mut self) -> Option<Message> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == FRAME_TERMINATOR as u8) {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = match std::str::from_utf8(&line[..pos]) {
                Ok(text) => text.trim_end_matches('\r'),
                Err(_) => {
                    log::warn!("discarding frame that is not valid UTF-8");
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }
            match Message::decode_frame(text) {
                Ok(msg) => {
                    log::debug!("received {}", msg.message_type().name());
                    return Some(msg);
                }
                Err(e) => log::warn!("discarding malformed frame: {}", e),
            }
        }
        None
    }
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection closed by peer")
    } else {
        anyhow::anyhow!("Write error: {}", e)
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection reset by peer")
    } else {
        anyhow::anyhow!("Read error: {}", e)
    }
}

#[async_trait::async_trait]
impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        let frame = msg.encode_frame();
        if frame.len() > self.max_frame_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                frame.len(),
                self.max_frame_size
            ));
        }
        let send_timeout = self.send_timeout;
        let stream = &mut self.stream;
        let send_op = async {
            stream.write_all(frame.as_bytes()).await.map_err(write_error)?;
            stream.flush().await.map_err(write_error)?;
            anyhow::Ok(())
        };
        timeout(send_timeout, send_op)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", send_timeout))??;
        log::debug!("sent {}", msg.message_type().name());
        Ok(())
    }

    async fn recv(&mut self) -> anyhow::Result<Option<Message>> {
        loop {
            if let Some(msg) = self.next_buffered() {
                return Ok(Some(msg));
            }
            if self.buffer.len() > self.max_frame_size {
                return Err(anyhow::anyhow!(
                    "Frame exceeds {} bytes without a terminator",
                    self.max_frame_size
                ));
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await.map_err(read_error)?;
            if n == 0 {
                if !self.buffer.is_empty() {
                    log::warn!("peer closed with {} bytes of partial frame", self.buffer.len());
                    self.buffer.clear();
                }
                return Ok(None);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(write_error(e)),
        }
    }
}
