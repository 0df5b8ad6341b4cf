//! # Railyard
//!
//! An authoritative multiplayer server for a grid-based train-track game.
//!
//! Players lay track on a shared grid and launch trains from a fixed spawn
//! cell. The server runs the simulation at a fixed tick rate and pushes
//! every change to every connected browser over WebSockets.
//!
//! ```text
//! railyard-transport   WebSocket accept / frames
//! railyard-protocol    Envelope, ClientMessage, ServerMessage, JSON codec
//! railyard-session     connected sessions, names, track colours
//! railyard-sim         grid, trains, economy, World
//! railyard-tick        fixed-timestep scheduler
//! railyard-world       the actor that owns the World
//! railyard             this crate: server and connection handler
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use railyard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RailyardError> {
//!     RailyardServer::builder()
//!         .bind("0.0.0.0:3000")
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::RailyardError;
pub use server::{RailyardServer, RailyardServerBuilder};

pub use railyard_protocol as protocol;
pub use railyard_session as session;
pub use railyard_sim as sim;
pub use railyard_tick as tick;
pub use railyard_transport as transport;
pub use railyard_world as world;

/// The types most servers need.
pub mod prelude {
    pub use crate::{RailyardError, RailyardServer, RailyardServerBuilder};
    pub use railyard_protocol::{ClientMessage, Envelope, ServerMessage, SessionId};
    pub use railyard_session::SessionConfig;
    pub use railyard_sim::SimConfig;
    pub use railyard_tick::{TickConfig, TickMetrics, TickPolicy};
    pub use railyard_world::{Variant, WorldConfig, WorldHandle};
}
