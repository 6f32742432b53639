//! Remote memory service abstraction
//!
//! The wire protocol that actually reaches the controller (framing, PDU
//! negotiation, sockets) lives behind [`RemoteMemoryService`]. The engine
//! only ever sees numbered blocks of bytes plus a status code per call, and
//! formats failures through [`RemoteMemoryService::describe_error`] so the
//! transport's own error text reaches the operator unchanged.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Controller network endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Non-zero status code reported by the remote memory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStatus(pub i32);

/// Per-call result of the remote memory service.
pub type RemoteResult<T> = std::result::Result<T, RemoteStatus>;

/// Byte-level access to the controller's structured memory blocks.
///
/// Calls are synchronous from the engine's point of view: the single control
/// loop awaits each one inline and nothing preempts it. Liveness is whatever
/// `is_connected` reports on a given call; the engine generates no heartbeat
/// of its own.
#[async_trait]
pub trait RemoteMemoryService: Send {
    /// Open a session to the processor unit selected by rack/slot.
    async fn connect(&mut self, endpoint: &Endpoint, rack: u16, slot: u16) -> RemoteResult<()>;

    /// Whether the service currently considers the link established.
    fn is_connected(&self) -> bool;

    /// Read `len` bytes starting at `start` from data block `db_number`.
    async fn read_bytes(&mut self, db_number: u16, start: u32, len: u32) -> RemoteResult<Vec<u8>>;

    /// Write `bytes` starting at `start` into data block `db_number`.
    async fn write_bytes(&mut self, db_number: u16, start: u32, bytes: &[u8]) -> RemoteResult<()>;

    /// Drop the session.
    async fn disconnect(&mut self);

    /// Human-readable text for a status code.
    fn describe_error(&self, status: RemoteStatus) -> String;
}

/// Preflight check run before any connect candidate is tried: can a plain
/// transport handshake reach the service's port at all. Separated from
/// [`RemoteMemoryService`] so connection supervision is testable without a
/// network.
#[async_trait]
pub trait TransportProbe: Send {
    async fn probe(&self, endpoint: &Endpoint) -> bool;
}

/// Real probe: a bounded TCP connect to the endpoint.
pub struct TcpProbe {
    pub timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

/// Fixed-answer probe for simulator backends and tests, where no real
/// listener exists to handshake with.
pub struct StaticProbe {
    pub reachable: bool,
}

impl StaticProbe {
    pub fn up() -> Self {
        Self { reachable: true }
    }
}

#[async_trait]
impl TransportProbe for StaticProbe {
    async fn probe(&self, _endpoint: &Endpoint) -> bool {
        self.reachable
    }
}

#[async_trait]
impl TransportProbe for TcpProbe {
    async fn probe(&self, endpoint: &Endpoint) -> bool {
        matches!(
            tokio::time::timeout(
                self.timeout,
                TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
            )
            .await,
            Ok(Ok(_))
        )
    }
}
