//! Transport sink capability and the UDP implementation.

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::StreamResult;

/// Capability: best-effort byte transport toward one address.
///
/// # Contract
/// - `send` ships one payload; delivery is not acknowledged.
/// - Failures surface as [`StreamError::SendFailed`] and are recoverable;
///   the sending loop logs them and keeps going.
/// - The target address is fixed at construction and only reported here.
///
/// [`StreamError::SendFailed`]: crate::error::StreamError::SendFailed
#[async_trait]
pub trait Sink: Send + Sync {
    /// Ship one payload to the sink's address.
    async fn send(&self, payload: &[u8]) -> StreamResult<()>;

    /// Target address, for diagnostics.
    fn address(&self) -> &str;
}

/// UDP datagram sink with a pinned peer.
///
/// One payload becomes one datagram; payloads beyond the datagram size
/// limit fail with `SendFailed` and are dropped by the caller's loop.
pub struct UdpSink {
    socket: UdpSocket,
    target: String,
}

impl UdpSink {
    /// Bind an ephemeral local socket and pin `target` as its peer.
    pub async fn connect(target: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(target).await?;
        Ok(Self {
            socket,
            target: target.to_owned(),
        })
    }
}

#[async_trait]
impl Sink for UdpSink {
    async fn send(&self, payload: &[u8]) -> StreamResult<()> {
        self.socket.send(payload).await?;
        Ok(())
    }

    fn address(&self) -> &str {
        &self.target
    }
}
