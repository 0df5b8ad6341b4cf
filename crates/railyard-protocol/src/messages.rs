//! Game messages: what clients ask for and what the server pushes back.
//!
//! Both enums are adjacently tagged with camelCase event names, so a
//! payload reads `{"type": "toggleTrack", "data": {"x": 3, "y": 10}}`.

use railyard_sim::{GridRows, Industry, Train, TrainId};
use serde::{Deserialize, Serialize};

use crate::Channel;

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Requests a client can make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Sets the display name shown in the player list. The name is the
    /// bare `data` string; a missing or `null` one registers anonymously.
    Register(Option<String>),

    /// Flips track at a cell. Off-grid coordinates are ignored.
    ToggleTrack { x: i64, y: i64 },

    /// Spawns a train at the spawn cell, if it has track.
    StartTrain,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Which request a [`ServerMessage::Rejected`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    ToggleTrack,
    StartTrain,
}

/// Static settings sent in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub train_speed: f64,
    pub grid_size: usize,
}

/// Wire form of a train.
///
/// The single-train variant leaves out `dx`, `dy` and `speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainView {
    pub id: TrainId,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    pub progress: f64,
    pub active: bool,
}

impl TrainView {
    /// `{id, x, y, dx, dy, speed, progress, active}`.
    pub fn full(train: &Train) -> Self {
        Self {
            dx: Some(train.heading().dx()),
            dy: Some(train.heading().dy()),
            speed: Some(train.speed()),
            ..Self::compact(train)
        }
    }

    /// `{id, x, y, progress, active}`.
    pub fn compact(train: &Train) -> Self {
        Self {
            id: train.id(),
            x: train.x(),
            y: train.y(),
            dx: None,
            dy: None,
            speed: None,
            progress: train.progress(),
            active: train.is_active(),
        }
    }
}

/// Everything a newly connected client needs to draw the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: GridRows,
    pub money: u64,
    pub trains: Vec<TrainView>,
    pub industries: Vec<Industry>,
    pub settings: Settings,
}

/// Messages pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full state, sent once when a session connects.
    Init(Snapshot),

    /// The whole grid, after any toggle.
    UpdateGrid(GridRows),

    /// Every active train, once per tick.
    State { trains: Vec<TrainView> },

    /// A train was spawned.
    TrainSpawn(TrainView),

    /// The new balance, once per credit.
    MoneyUpdate(u64),

    /// Registered player names in join order.
    PlayerList(Vec<String>),

    /// A request had no effect. Only sent when rejection acks are enabled.
    Rejected {
        request: RequestKind,
        reason: String,
    },
}

impl ServerMessage {
    /// The delivery guarantee this message needs.
    pub fn channel(&self) -> Channel {
        match self {
            Self::State { .. } => Channel::Unreliable,
            _ => Channel::ReliableOrdered,
        }
    }
}
