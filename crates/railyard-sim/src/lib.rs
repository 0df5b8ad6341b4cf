//! Authoritative simulation for Railyard.
//!
//! Pure, synchronous state: no I/O, no clocks, no async. The world actor in
//! `railyard-world` owns one [`World`] and is the only thing that calls its
//! mutating methods.
//!
//! # Layout
//!
//! - [`TrackGrid`]: tiles and derived connectivity
//! - [`TrainSimulator`]: train movement and junction choice
//! - [`Economy`]: the money counter
//! - [`World`]: the aggregate tying them together, one tick at a time
//!
//! ```text
//! toggle_track / spawn_train ──→ World ──tick()──→ TickReport { deliveries }
//! ```

mod config;
mod economy;
mod grid;
mod train;
mod world;

pub use config::{Industry, IndustryKind, SimConfig};
pub use economy::Economy;
pub use grid::{Connections, GridRows, Heading, Ownership, Tile, TrackGrid};
pub use train::{
    Completion, PROGRESS_SCALE, Train, TrainId, TrainSimulator, next_heading,
    speed_to_units,
};
pub use world::{Delivery, TickReport, World};
