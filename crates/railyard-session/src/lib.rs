//! Session bookkeeping for Railyard.
//!
//! A session is one open connection. Registering attaches a display name
//! and a track colour to it; nothing else about the player is stored.
//!
//! ```text
//! World actor (above)  ← asks who is connected, what colour they draw in
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below)  ← provides SessionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig};
