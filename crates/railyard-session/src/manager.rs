//! The session manager: every connected session and the player roster.
//!
//! Not thread-safe on its own. It is owned by the world actor and only
//! touched from that task.

use std::collections::HashMap;

use railyard_protocol::SessionId;

use crate::{Session, SessionConfig, SessionError};

/// Tracks connected sessions and the order players registered in.
///
/// ```text
/// create() ──→ [connected] ──register()──→ [registered] ──┐
///     │                                                    │
///     └──────────────────── remove() ◄─────────────────────┘
/// ```
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<SessionId, Session>,

    /// Registered sessions in registration order. Drives `roster()` and
    /// colour assignment.
    registered: Vec<SessionId>,

    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            registered: Vec::new(),
            config,
        }
    }

    /// Starts tracking a freshly connected session.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the id is already tracked.
    pub fn create(&mut self, id: SessionId) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyConnected(id));
        }
        tracing::info!(session_id = %id, "session created");
        Ok(&*self.sessions.entry(id).or_insert_with(|| Session::new(id)))
    }

    /// Records a display name. An empty name becomes the anonymous name.
    ///
    /// The first registration picks the colour at index
    /// `registered players % palette length`. Registering again only
    /// renames; the colour and roster position stay.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session is not tracked.
    pub fn register(&mut self, id: SessionId, name: &str) -> Result<&Session, SessionError> {
        let first_color = self.next_color();
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;

        let name = if name.is_empty() {
            self.config.anonymous_name.clone()
        } else {
            name.to_owned()
        };

        if session.color.is_none() {
            session.color = Some(first_color);
            self.registered.push(id);
        }
        tracing::info!(session_id = %id, %name, color = ?session.color, "player registered");
        session.name = Some(name);
        Ok(&*session)
    }

    /// Stops tracking a session and drops it from the roster.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session is not tracked.
    pub fn remove(&mut self, id: SessionId) -> Result<Session, SessionError> {
        let session = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        self.registered.retain(|registered| *registered != id);
        tracing::info!(session_id = %id, "session removed");
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Registered player names in registration order.
    pub fn roster(&self) -> Vec<String> {
        self.registered
            .iter()
            .filter_map(|id| self.sessions.get(id)?.name.clone())
            .collect()
    }

    /// The colour this session's track is drawn in.
    pub fn color_of(&self, id: SessionId) -> String {
        self.sessions
            .get(&id)
            .and_then(|session| session.color.clone())
            .unwrap_or_else(|| self.config.unregistered_color.clone())
    }

    /// Records that every current session was just sent the state for `tick`.
    pub fn mark_state_sent(&mut self, tick: u64) {
        for session in self.sessions.values_mut() {
            session.last_state_tick = tick;
        }
    }

    /// Every tracked session id, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn next_color(&self) -> String {
        let palette = &self.config.palette;
        if palette.is_empty() {
            return self.config.unregistered_color.clone();
        }
        palette[self.registered.len() % palette.len()].clone()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
