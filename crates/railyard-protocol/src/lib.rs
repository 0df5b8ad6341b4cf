//! Wire protocol for Railyard.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`Envelope`], [`Channel`], [`SessionId`], [`Recipient`]):
//!   framing and addressing.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the game events
//!   carried in an envelope's payload.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<ClientMessage>) → World
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    ClientMessage, RequestKind, ServerMessage, Settings, Snapshot, TrainView,
};
pub use types::{Channel, Envelope, Recipient, SessionId};
