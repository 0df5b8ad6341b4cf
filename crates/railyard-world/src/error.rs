//! Error types for the world layer.

use railyard_session::SessionError;

/// Errors returned by [`WorldHandle`](crate::WorldHandle).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world actor has stopped; its command channel is closed.
    #[error("world actor is not running")]
    Unavailable,

    #[error(transparent)]
    Session(#[from] SessionError),
}
