//! Inbound datagram boundary.
//!
//! One datagram is one complete JSON document; there is no fragmentation or
//! reassembly. The bytes are handed on untouched.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Largest datagram the listener accepts, in bytes.
pub const MAX_DATAGRAM: usize = 1500;

/// One received datagram. Dropped as soon as it has been normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    pub payload: Vec<u8>,
    /// Sender, for logging only.
    pub source: Option<SocketAddr>,
}

impl RawReading {
    pub fn new(payload: impl Into<Vec<u8>>, source: Option<SocketAddr>) -> Self {
        Self {
            payload: payload.into(),
            source,
        }
    }

    /// Payload as text for log lines; invalid UTF-8 is replaced.
    pub fn lossy_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum IngestError {
    /// The listen address could not be bound. Fatal at startup.
    Bind { addr: SocketAddr, source: io::Error },
    /// A receive call failed.
    Recv(io::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Bind { addr, source } => write!(f, "bind {addr} failed: {source}"),
            IngestError::Recv(e) => write!(f, "datagram receive failed: {e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Bind { source, .. } => Some(source),
            IngestError::Recv(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Blocking-style receive of the next datagram.
///
/// `Ok(None)` means the source is exhausted (only finite test sources do
/// this; the UDP listener never ends on its own).
#[async_trait::async_trait]
pub trait IngestSource: Send {
    async fn recv(&mut self) -> Result<Option<RawReading>, IngestError>;
}

// ---------------------------------------------------------------------------
// UDP listener
// ---------------------------------------------------------------------------

/// Connectionless listener bound to a fixed local address.
#[derive(Debug)]
pub struct UdpIngest {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpIngest {
    pub async fn bind(addr: SocketAddr, max_datagram: usize) -> Result<Self, IngestError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| IngestError::Bind { addr, source })?;
        Ok(Self {
            socket,
            buf: vec![0u8; max_datagram.max(1)],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait::async_trait]
impl IngestSource for UdpIngest {
    async fn recv(&mut self) -> Result<Option<RawReading>, IngestError> {
        let (n, from) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(IngestError::Recv)?;
        Ok(Some(RawReading::new(&self.buf[..n], Some(from))))
    }
}
