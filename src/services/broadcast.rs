//! Broadcast channel — deliver envelopes to one session or a whole room.
//!
//! DESIGN
//! ======
//! Each live connection attaches a bounded `mpsc` sender under its session
//! id; the connection task drains the receiver into the socket. Room fan-out
//! resolves members through the shared [`RoomRegistry`] at send time.
//!
//! Room broadcasts include the originating session, so every client derives
//! its desk state from the broadcast stream alone.
//!
//! Delivery is best-effort: a full or closed queue skips that session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::warn;

use crate::frame::Envelope;
use crate::services::room::{RoomRegistry, SessionId};

#[derive(Clone)]
pub struct BroadcastChannel {
    rooms: RoomRegistry,
    sessions: Arc<RwLock<HashMap<SessionId, mpsc::Sender<Envelope>>>>,
}

impl BroadcastChannel {
    #[must_use]
    pub fn new(rooms: RoomRegistry) -> Self {
        Self { rooms, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn attach(&self, session: SessionId, tx: mpsc::Sender<Envelope>) {
        self.sessions.write().await.insert(session, tx);
    }

    pub async fn detach(&self, session: SessionId) {
        self.sessions.write().await.remove(&session);
    }

    /// Deliver to exactly one session. Returns whether it was queued.
    pub async fn send_to(&self, session: SessionId, envelope: Envelope) -> bool {
        let sessions = self.sessions.read().await;
        let Some(tx) = sessions.get(&session) else {
            return false;
        };
        deliver(session, tx, envelope)
    }

    /// Deliver to every member of the origin's current room, origin included.
    /// Returns the number of sessions the envelope was queued for.
    pub async fn broadcast_to_room(&self, origin: SessionId, envelope: &Envelope) -> usize {
        let Some(room) = self.rooms.room_of(origin) else {
            return 0;
        };
        self.broadcast_room(&room, envelope).await
    }

    /// Deliver to every member of a named room.
    pub async fn broadcast_room(&self, room: &str, envelope: &Envelope) -> usize {
        let members = self.rooms.members_of(room);
        if members.is_empty() {
            return 0;
        }

        let sessions = self.sessions.read().await;
        members
            .into_iter()
            .filter_map(|member| sessions.get(&member).map(|tx| (member, tx)))
            .filter(|(member, tx)| deliver(*member, tx, envelope.clone()))
            .count()
    }
}

fn deliver(session: SessionId, tx: &mpsc::Sender<Envelope>, envelope: Envelope) -> bool {
    match tx.try_send(envelope) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(env)) => {
            warn!(%session, action = %env.action, "session queue full; dropping envelope");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
