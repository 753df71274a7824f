//! Room registry — which session sits in which desk.
//!
//! DESIGN
//! ======
//! Two maps kept in lockstep behind one mutex:
//! - `session -> room` answers "where is this session?"
//! - `room -> members` answers "who receives this broadcast?"
//!
//! A session is in at most one room. Joining moves it; leaving (or
//! disconnecting) removes it. Rooms come into existence on first join and
//! their entry is dropped once the last member leaves, which is
//! indistinguishable from an empty room to callers.
//!
//! The registry is owned by `AppState` and constructed once per server
//! instance. Nothing is persisted; clients re-join after a restart.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    rooms_by_session: HashMap<SessionId, String>,
    members_by_room: HashMap<String, HashSet<SessionId>>,
}

impl RegistryInner {
    fn remove(&mut self, session: SessionId) -> Option<String> {
        let room = self.rooms_by_session.remove(&session)?;
        if let Some(members) = self.members_by_room.get_mut(&room) {
            members.remove(&session);
            if members.is_empty() {
                self.members_by_room.remove(&room);
            }
        }
        Some(room)
    }
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // Every mutation leaves both maps consistent before it can panic.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `session` into `room`, leaving any previous room. Returns the
    /// members of `room` after the join, the joiner included.
    pub fn join(&self, session: SessionId, room: &str) -> HashSet<SessionId> {
        let mut inner = self.lock();
        if inner.rooms_by_session.get(&session).map(String::as_str) != Some(room) {
            if let Some(previous) = inner.remove(session) {
                debug!(%session, %previous, "session switched rooms");
            }
            inner.rooms_by_session.insert(session, room.to_owned());
        }
        let members = inner.members_by_room.entry(room.to_owned()).or_default();
        members.insert(session);
        members.clone()
    }

    /// Remove `session` from its room. Returns the room it left, if any.
    pub fn leave(&self, session: SessionId) -> Option<String> {
        self.lock().remove(session)
    }

    #[must_use]
    pub fn room_of(&self, session: SessionId) -> Option<String> {
        self.lock().rooms_by_session.get(&session).cloned()
    }

    #[must_use]
    pub fn members_of(&self, room: &str) -> HashSet<SessionId> {
        self.lock().members_by_room.get(room).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
