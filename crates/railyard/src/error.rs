//! Unified error type for Railyard.

use railyard_protocol::ProtocolError;
use railyard_session::SessionError;
use railyard_transport::TransportError;
use railyard_world::WorldError;

/// Top-level error wrapping every crate's error.
///
/// `#[from]` lets `?` convert sub-crate errors on the way up.
#[derive(Debug, thiserror::Error)]
pub enum RailyardError {
    /// Bind, accept, send or receive failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The world actor refused or is gone.
    #[error(transparent)]
    World(#[from] WorldError),
}
