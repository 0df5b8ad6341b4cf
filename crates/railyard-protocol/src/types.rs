//! Envelope and addressing types shared by every message.

use std::fmt;

use railyard_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies one connected client for as long as its connection lives.
///
/// Serialized as a bare number. Its `Display` form (`S-7`) is what gets
/// stamped into a tile's `owner` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Each connection gets exactly one session, so the ids line up.
impl From<ConnectionId> for SessionId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected session.
    All,
    /// One session only.
    Session(SessionId),
}

impl Recipient {
    /// Whether `session` is addressed.
    pub fn includes(&self, session: SessionId) -> bool {
        match self {
            Self::All => true,
            Self::Session(id) => *id == session,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Delivery guarantee requested for a frame.
///
/// Per-tick `state` frames are superseded 60 times a second, so they may
/// be dropped; everything else must arrive in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    #[default]
    ReliableOrdered,
    ReliableUnordered,
    Unreliable,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The frame wrapper. Every WebSocket message is one envelope.
///
/// ```text
/// { "seq": 12, "timestamp": 3400, "channel": "Unreliable",
///   "payload": { "type": "state", "data": { "trains": [...] } } }
/// ```
///
/// Clients may omit `seq`, `timestamp` and `channel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-connection sequence number, from 1 for server frames.
    #[serde(default)]
    pub seq: u64,

    /// Milliseconds since the connection was accepted.
    #[serde(default)]
    pub timestamp: u64,

    #[serde(default)]
    pub channel: Channel,

    pub payload: T,
}
