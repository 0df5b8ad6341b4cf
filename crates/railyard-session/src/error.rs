//! Error types for the session layer.

use railyard_protocol::SessionId;

/// Errors from [`SessionManager`](crate::SessionManager).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists with this id. Either it never connected or it
    /// has already been removed.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A session with this id is already tracked.
    #[error("session {0} is already connected")]
    AlreadyConnected(SessionId),
}
