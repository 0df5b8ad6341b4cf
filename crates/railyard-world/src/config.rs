//! World configuration.

use railyard_session::SessionConfig;
use railyard_sim::SimConfig;
use railyard_tick::TickConfig;

/// Which flavour of the game the world runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Tiles remember who laid them, trains carry their heading and
    /// speed on the wire, any number of trains may run.
    #[default]
    Multiplayer,
    /// Bare track tiles, compact trains, one train at a time.
    SingleTrain,
}

/// Everything needed to start a world actor.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub sim: SimConfig,
    pub tick: TickConfig,
    pub session: SessionConfig,
    pub variant: Variant,

    /// Send `rejected` to the requester when a toggle or spawn has no
    /// effect. Off by default, in which case refusals are silent.
    pub reject_acks: bool,

    /// Capacity of the command channel. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            tick: TickConfig::default(),
            session: SessionConfig::default(),
            variant: Variant::default(),
            reject_acks: false,
            channel_size: 64,
        }
    }
}

impl WorldConfig {
    /// The single-train variant: at most one train, bare tiles.
    pub fn single_train() -> Self {
        Self {
            sim: SimConfig {
                max_trains: Some(1),
                ..SimConfig::default()
            },
            variant: Variant::SingleTrain,
            ..Self::default()
        }
    }
}
