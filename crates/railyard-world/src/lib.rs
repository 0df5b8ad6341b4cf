//! The world actor for Railyard.
//!
//! One Tokio task owns the simulation, the connected sessions and their
//! outbound channels. Requests arrive as commands on a bounded channel and
//! ticks arrive from a [`TickScheduler`](railyard_tick::TickScheduler) in
//! the same `select!` loop, so every change is applied in full before the
//! next one starts.
//!
//! # Key types
//!
//! - [`WorldHandle`]: cloneable sender side, one per connection task
//! - [`WorldConfig`]: simulation, tick, and session settings
//! - [`SessionSender`]: where a session's outbound messages go

mod config;
mod error;
mod synchronizer;

pub use config::{Variant, WorldConfig};
pub use error::WorldError;
pub use synchronizer::{SessionSender, WorldHandle, spawn_world};
