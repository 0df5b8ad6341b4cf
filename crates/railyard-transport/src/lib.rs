//! Transport layer for Railyard.
//!
//! Accepting a peer is split in two. [`Transport::accept`] only takes the
//! raw socket off the listener, and [`Transport::upgrade`] runs the protocol
//! handshake under a deadline. The server upgrades inside the per-connection
//! task, so a peer that connects and then goes quiet costs one task until
//! its deadline and never holds up the accept loop.
//!
//! Everything above this crate sees bytes only; framing and JSON live in
//! `railyard-protocol`.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::time::Duration;

/// Opaque identifier for a connection, unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener handing out peers.
pub trait Transport: Send + Sync + 'static {
    /// A peer that has connected but not finished the handshake.
    type Pending: Send + 'static;
    type Connection: Connection;

    /// Takes the next peer off the listener. Does no protocol I/O.
    ///
    /// # Errors
    /// [`TransportError::Shutdown`] once [`shutdown`](Self::shutdown) ran.
    async fn accept(&mut self) -> Result<Self::Pending, TransportError>;

    /// Completes the handshake for one peer.
    ///
    /// # Errors
    /// [`TransportError::HandshakeTimedOut`] if the peer has not finished
    /// within `deadline`; the socket is dropped.
    async fn upgrade(
        pending: Self::Pending,
        deadline: Duration,
    ) -> Result<Self::Connection, TransportError>;

    /// Stops accepting. Connections already handed out keep working.
    async fn shutdown(&self) -> Result<(), TransportError>;
}

/// An upgraded connection carrying frames both ways.
///
/// `send` and `recv` take `&self` and may run at the same time from
/// different futures; a pending `recv` never blocks a `send`.
pub trait Connection: Send + Sync + 'static {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Sends a frame that a newer one will supersede, such as a per-tick
    /// `state`. A stream transport has no cheaper path, so this defaults
    /// to `send`.
    async fn send_unreliable(&self, data: &[u8]) -> Result<(), TransportError> {
        self.send(data).await
    }

    /// Idempotent.
    async fn close(&self) -> Result<(), TransportError>;

    fn id(&self) -> ConnectionId;
}
