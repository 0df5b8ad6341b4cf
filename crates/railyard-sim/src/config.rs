//! Simulation settings and the static industry markers.

use serde::{Deserialize, Serialize};

/// Kind of a static industry marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndustryKind {
    Mine,
    Factory,
}

/// A fixed point of interest on the map. Clients draw these; the
/// simulation does not read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: IndustryKind,
}

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Side length of the square grid.
    pub grid_size: usize,

    /// Spawn cell. `None` means column 0, row `grid_size / 2`.
    pub spawn: Option<(i32, i32)>,

    /// Train speed in cells per tick.
    pub train_speed: f64,

    /// Money credited for each train that leaves the network.
    pub delivery_reward: u64,

    /// Cap on simultaneously active trains. `None` = unlimited.
    pub max_trains: Option<usize>,

    /// Static markers included in snapshots.
    pub industries: Vec<Industry>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            spawn: None,
            train_speed: 0.1,
            delivery_reward: 100,
            max_trains: None,
            industries: vec![
                Industry {
                    x: 2,
                    y: 2,
                    kind: IndustryKind::Mine,
                },
                Industry {
                    x: 17,
                    y: 17,
                    kind: IndustryKind::Factory,
                },
            ],
        }
    }
}

impl SimConfig {
    /// Largest supported grid side.
    pub const MAX_GRID_SIZE: usize = 1024;

    /// The cell trains appear on.
    pub fn spawn_cell(&self) -> (i32, i32) {
        self.spawn.unwrap_or((0, (self.grid_size / 2) as i32))
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `grid_size` forced into `1..=MAX_GRID_SIZE`.
    /// - `train_speed` forced into `(0, 1]`; a non-finite speed falls back
    ///   to the default.
    pub fn validated(mut self) -> Self {
        let side = self.grid_size.clamp(1, Self::MAX_GRID_SIZE);
        if side != self.grid_size {
            tracing::warn!(
                requested = self.grid_size,
                used = side,
                "grid_size out of range, clamping"
            );
            self.grid_size = side;
        }

        if !self.train_speed.is_finite() {
            tracing::warn!(speed = self.train_speed, "train_speed not finite, using default");
            self.train_speed = Self::default().train_speed;
        } else if self.train_speed <= 0.0 || self.train_speed > 1.0 {
            let speed = self.train_speed.clamp(f64::MIN_POSITIVE, 1.0);
            tracing::warn!(
                requested = self.train_speed,
                used = speed,
                "train_speed out of range, clamping"
            );
            self.train_speed = speed;
        }

        let (x, y) = self.spawn_cell();
        let side = self.grid_size as i32;
        if !(0..side).contains(&x) || !(0..side).contains(&y) {
            tracing::warn!(x, y, "spawn cell is off the grid, trains can never spawn");
        }
        self
    }
}
