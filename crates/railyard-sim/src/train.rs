//! Train movement and the junction decision rule.
//!
//! A train sits on one cell and accumulates sub-cell progress every tick.
//! Only when a full cell's worth has built up does it decide where to go:
//!
//! ```text
//!            spawn()                    no continuation
//! Unspawned ─────────→ Moving ──────────────────────────→ Derailed (removed)
//!                      │    ↑
//!                      └────┘ straight ahead, or first N/E/S/W turn
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::{Connections, Heading, TrackGrid};

/// Fixed-point denominator for progress and speed: one cell is a million
/// units, so `0.1` cells per tick is exactly 100 000 units.
pub const PROGRESS_SCALE: u32 = 1_000_000;

/// Converts a cells-per-tick speed into progress units.
///
/// Clamped to `1..=PROGRESS_SCALE` so a train always makes progress and
/// never skips a cell in one tick.
pub fn speed_to_units(cells_per_tick: f64) -> u32 {
    let units = (cells_per_tick * f64::from(PROGRESS_SCALE)).round();
    if units.is_nan() || units < 1.0 {
        1
    } else if units >= f64::from(PROGRESS_SCALE) {
        PROGRESS_SCALE
    } else {
        units as u32
    }
}

/// Sequential train identifier, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrainId(pub u64);

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A train on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    id: TrainId,
    x: i32,
    y: i32,
    heading: Heading,
    progress: u32,
    speed: u32,
    active: bool,
}

impl Train {
    pub fn id(&self) -> TrainId {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Progress through the current cell in `[0, 1)`.
    pub fn progress(&self) -> f64 {
        f64::from(self.progress) / f64::from(PROGRESS_SCALE)
    }

    /// Speed in cells per tick.
    pub fn speed(&self) -> f64 {
        f64::from(self.speed) / f64::from(PROGRESS_SCALE)
    }

    /// Raw progress in `1 / PROGRESS_SCALE` units.
    pub fn progress_units(&self) -> u32 {
        self.progress
    }

    /// Advances one tick. Returns `false` when the train has left the
    /// network and is now inactive.
    fn advance(&mut self, grid: &TrackGrid) -> bool {
        if !self.active {
            return false;
        }
        self.progress += self.speed;
        if self.progress < PROGRESS_SCALE {
            return true;
        }
        self.progress = 0;

        // Fast path: keep going straight.
        let (nx, ny) = self.heading.step(self.x, self.y);
        if grid.has_track(nx, ny) {
            self.x = nx;
            self.y = ny;
            return true;
        }

        match next_heading(self.heading, grid.connections(self.x, self.y)) {
            Some(turn) => {
                self.heading = turn;
                (self.x, self.y) = turn.step(self.x, self.y);
                true
            }
            None => {
                self.active = false;
                false
            }
        }
    }
}

/// Picks the heading a train takes at a junction.
///
/// Scans North, East, South, West and returns the first connected
/// direction that is not a reversal of `current`. `None` means the train
/// has nowhere to go.
pub fn next_heading(current: Heading, connections: Connections) -> Option<Heading> {
    let reverse = current.opposite();
    Heading::PRIORITY
        .into_iter()
        .find(|h| *h != reverse && connections.contains(*h))
}

/// A train that left the network this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub train_id: TrainId,
    /// The last cell the train occupied.
    pub x: i32,
    pub y: i32,
}

/// Owns every active train and moves them over a [`TrackGrid`].
#[derive(Debug, Clone)]
pub struct TrainSimulator {
    trains: Vec<Train>,
    next_id: u64,
    spawn: (i32, i32),
    speed: u32,
    max_trains: Option<usize>,
}

impl TrainSimulator {
    /// Creates a simulator that spawns trains at `spawn` moving at `speed`
    /// progress units per tick.
    pub fn new(spawn: (i32, i32), speed: u32, max_trains: Option<usize>) -> Self {
        Self {
            trains: Vec::new(),
            next_id: 1,
            spawn,
            speed: speed.clamp(1, PROGRESS_SCALE),
            max_trains,
        }
    }

    /// Puts a new eastbound train on the spawn cell.
    ///
    /// Returns `None` without side effects if the spawn cell has no track
    /// or the train cap is reached.
    pub fn spawn(&mut self, grid: &TrackGrid) -> Option<&Train> {
        let (x, y) = self.spawn;
        if !grid.has_track(x, y) {
            return None;
        }
        if self.max_trains.is_some_and(|max| self.trains.len() >= max) {
            return None;
        }

        let id = TrainId(self.next_id);
        self.next_id += 1;
        self.trains.push(Train {
            id,
            x,
            y,
            heading: Heading::East,
            progress: 0,
            speed: self.speed,
            active: true,
        });
        tracing::info!(train_id = %id, x, y, "train spawned");
        self.trains.last()
    }

    /// Advances every train one tick.
    ///
    /// Trains that ran out of track are removed and reported, each exactly
    /// once, in spawn order.
    pub fn tick(&mut self, grid: &TrackGrid) -> Vec<Completion> {
        let mut completions = Vec::new();
        self.trains.retain_mut(|train| {
            if train.advance(grid) {
                return true;
            }
            tracing::debug!(
                train_id = %train.id,
                x = train.x,
                y = train.y,
                "train left the network"
            );
            completions.push(Completion {
                train_id: train.id,
                x: train.x,
                y: train.y,
            });
            false
        });
        completions
    }

    /// All active trains, in spawn order.
    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    /// The cell new trains appear on.
    pub fn spawn_cell(&self) -> (i32, i32) {
        self.spawn
    }
}
