//! Session types.

use railyard_protocol::SessionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Naming and colouring rules for registered players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Track colours handed out in registration order, wrapping around.
    pub palette: Vec<String>,

    /// Name used when a player registers with an empty one.
    pub anonymous_name: String,

    /// Colour for track laid by a session that never registered.
    pub unregistered_color: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            palette: ["#ff0000", "#0000ff", "#00aa00", "#aa00aa", "#ff8800"]
                .map(String::from)
                .to_vec(),
            anonymous_name: "Anonymous".into(),
            unregistered_color: "#444".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connected client.
///
/// `name` and `color` stay `None` until the client registers. Unregistered
/// sessions still receive every broadcast and may edit the world.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub name: Option<String>,
    pub color: Option<String>,

    /// Tick number of the last `state` broadcast this session was sent.
    /// Zero until the first tick after connecting.
    pub last_state_tick: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            name: None,
            color: None,
            last_state_tick: 0,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }
}
