//! The track grid: a square matrix of tiles and the connectivity derived
//! from it.
//!
//! Connectivity is never stored. Two orthogonal neighbours are connected
//! iff both carry track, so every query recomputes it from the tiles.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Heading
// ---------------------------------------------------------------------------

/// One of the four grid directions a train can face.
///
/// Screen coordinates: `y` grows downward, so North is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Junction priority order. The first connected, non-reversing entry wins.
    pub const PRIORITY: [Heading; 4] =
        [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Column delta.
    pub fn dx(self) -> i32 {
        match self {
            Self::East => 1,
            Self::West => -1,
            Self::North | Self::South => 0,
        }
    }

    /// Row delta.
    pub fn dy(self) -> i32 {
        match self {
            Self::South => 1,
            Self::North => -1,
            Self::East | Self::West => 0,
        }
    }

    /// The heading pointing the other way.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Builds a heading from a `(dx, dy)` pair. Exactly one component must
    /// be ±1, the other 0.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }

    /// The cell one step from `(x, y)` in this heading.
    pub fn step(self, x: i32, y: i32) -> (i32, i32) {
        (x + self.dx(), y + self.dy())
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// Who laid a piece of track. Only present in the multiplayer variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// Display id of the session that placed the track.
    pub owner: String,
    /// CSS colour the client should paint the track with.
    pub color: String,
}

/// One grid cell.
///
/// On the wire a tile is `null` (empty), `true` (bare track) or
/// `{"owner": .., "color": ..}` (owned track). Decoding also accepts
/// `false`, `0` and `1` so grids from flag-only clients round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "TileRepr", into = "TileRepr")]
pub enum Tile {
    #[default]
    Empty,
    Track(Option<Ownership>),
}

impl Tile {
    /// Whether this cell carries track.
    pub fn has_track(&self) -> bool {
        matches!(self, Self::Track(_))
    }

    /// Ownership metadata, if the track has any.
    pub fn ownership(&self) -> Option<&Ownership> {
        match self {
            Self::Track(owner) => owner.as_ref(),
            Self::Empty => None,
        }
    }
}

/// Untagged wire shape for [`Tile`]. Variant order matters: serde tries
/// them top to bottom.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TileRepr {
    Owned(Ownership),
    Flag(bool),
    Bit(u8),
    Empty,
}

impl From<TileRepr> for Tile {
    fn from(repr: TileRepr) -> Self {
        match repr {
            TileRepr::Owned(owner) => Tile::Track(Some(owner)),
            TileRepr::Flag(true) => Tile::Track(None),
            TileRepr::Bit(bit) if bit != 0 => Tile::Track(None),
            TileRepr::Flag(false) | TileRepr::Bit(_) | TileRepr::Empty => {
                Tile::Empty
            }
        }
    }
}

impl From<Tile> for TileRepr {
    fn from(tile: Tile) -> Self {
        match tile {
            Tile::Empty => TileRepr::Empty,
            Tile::Track(None) => TileRepr::Flag(true),
            Tile::Track(Some(owner)) => TileRepr::Owned(owner),
        }
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Which orthogonal neighbours of a cell are connected to it by track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Connections {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
}

impl Connections {
    /// Whether the neighbour in `heading` is connected.
    pub fn contains(&self, heading: Heading) -> bool {
        match heading {
            Heading::North => self.north,
            Heading::East => self.east,
            Heading::South => self.south,
            Heading::West => self.west,
        }
    }

    /// Number of connected neighbours.
    pub fn count(&self) -> usize {
        Heading::PRIORITY
            .iter()
            .filter(|h| self.contains(**h))
            .count()
    }
}

// ---------------------------------------------------------------------------
// TrackGrid
// ---------------------------------------------------------------------------

/// Row-major wire view of a grid.
pub type GridRows = Vec<Vec<Tile>>;

/// A square grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGrid {
    side: usize,
    tiles: Vec<Tile>,
}

impl TrackGrid {
    /// Creates an empty `side × side` grid.
    pub fn new(side: usize) -> Self {
        Self {
            side,
            tiles: vec![Tile::Empty; side * side],
        }
    }

    /// Side length.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Whether `(x, y)` lies on the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.side && y < self.side).then_some(y * self.side + x)
    }

    /// The tile at `(x, y)`, or `None` off the grid.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index(x, y).map(|i| &self.tiles[i])
    }

    /// Whether `(x, y)` has track. Off-grid cells never do.
    pub fn has_track(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_some_and(Tile::has_track)
    }

    /// Sets or clears track at `(x, y)` and returns whether track was there
    /// before. Off-grid coordinates are a no-op returning `false`.
    ///
    /// Laying track where track already exists keeps its ownership.
    pub fn set_track(&mut self, x: i32, y: i32, present: bool) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let previous = self.tiles[i].has_track();
        if present != previous {
            self.tiles[i] = if present {
                Tile::Track(None)
            } else {
                Tile::Empty
            };
        }
        previous
    }

    /// Flips the tile at `(x, y)`. New track is stamped with `ownership`.
    ///
    /// Returns the new presence, or `None` when `(x, y)` is off the grid.
    pub fn toggle(
        &mut self,
        x: i32,
        y: i32,
        ownership: Option<Ownership>,
    ) -> Option<bool> {
        let i = self.index(x, y)?;
        let tile = &mut self.tiles[i];
        *tile = if tile.has_track() {
            Tile::Empty
        } else {
            Tile::Track(ownership)
        };
        Some(tile.has_track())
    }

    /// Track connectivity of `(x, y)` to its four neighbours.
    ///
    /// A cell without track has no connections.
    pub fn connections(&self, x: i32, y: i32) -> Connections {
        if !self.has_track(x, y) {
            return Connections::default();
        }
        let linked = |h: Heading| {
            let (nx, ny) = h.step(x, y);
            self.has_track(nx, ny)
        };
        Connections {
            north: linked(Heading::North),
            east: linked(Heading::East),
            south: linked(Heading::South),
            west: linked(Heading::West),
        }
    }

    /// Number of track tiles.
    pub fn track_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.has_track()).count()
    }

    /// Copies the grid out as row-major rows for the wire.
    pub fn rows(&self) -> GridRows {
        if self.side == 0 {
            return Vec::new();
        }
        self.tiles
            .chunks(self.side)
            .map(<[Tile]>::to_vec)
            .collect()
    }
}
