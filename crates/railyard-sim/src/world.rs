//! The `World` aggregate: the only way simulation state changes.
//!
//! Grid, trains and money live together so one owner can apply each
//! request or tick as a single step. Nothing outside this type mutates them.

use crate::{
    Completion, Economy, GridRows, Industry, Ownership, SimConfig, TrackGrid,
    Train, TrainSimulator, speed_to_units,
};

/// A completed delivery and the balance right after it was credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub completion: Completion,
    pub money: u64,
}

/// What happened during one [`World::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// One entry per train that left the network, in credit order.
    pub deliveries: Vec<Delivery>,
}

impl TickReport {
    /// Whether money changed this tick.
    pub fn money_changed(&self) -> bool {
        !self.deliveries.is_empty()
    }
}

/// The full simulation state.
#[derive(Debug, Clone)]
pub struct World {
    config: SimConfig,
    grid: TrackGrid,
    trains: TrainSimulator,
    economy: Economy,
    tick: u64,
}

impl World {
    /// Creates an empty world. The config is validated first.
    pub fn new(config: SimConfig) -> Self {
        let config = config.validated();
        let grid = TrackGrid::new(config.grid_size);
        let trains = TrainSimulator::new(
            config.spawn_cell(),
            speed_to_units(config.train_speed),
            config.max_trains,
        );
        Self {
            config,
            grid,
            trains,
            economy: Economy::new(),
            tick: 0,
        }
    }

    /// Flips track at `(x, y)`. Returns the new presence, or `None` when
    /// the coordinates are off the grid (nothing changes).
    pub fn toggle_track(
        &mut self,
        x: i32,
        y: i32,
        ownership: Option<Ownership>,
    ) -> Option<bool> {
        self.grid.toggle(x, y, ownership)
    }

    /// Spawns a train at the spawn cell. Returns a copy of it, or `None`
    /// if the spawn precondition failed.
    pub fn spawn_train(&mut self) -> Option<Train> {
        self.trains.spawn(&self.grid).cloned()
    }

    /// Runs one logical step: move every train, then credit one reward per
    /// train that left the network.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let reward = self.config.delivery_reward;
        let deliveries = self
            .trains
            .tick(&self.grid)
            .into_iter()
            .map(|completion| Delivery {
                money: self.economy.credit(reward),
                completion,
            })
            .collect();
        tracing::trace!(tick = self.tick, trains = self.trains.len(), "tick");
        TickReport {
            tick: self.tick,
            deliveries,
        }
    }

    pub fn grid(&self) -> &TrackGrid {
        &self.grid
    }

    /// Row-major copy of the grid.
    pub fn grid_rows(&self) -> GridRows {
        self.grid.rows()
    }

    pub fn trains(&self) -> &[Train] {
        self.trains.trains()
    }

    pub fn money(&self) -> u64 {
        self.economy.money()
    }

    pub fn industries(&self) -> &[Industry] {
        &self.config.industries
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
