//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is built once at startup and injected into Axum handlers via
//! the `State` extractor. It owns the room registry, the broadcast channel
//! (which shares that registry), and the storage gateway. Dropping the last
//! clone at shutdown drops all of it; there is no process-global state.

use std::sync::Arc;

use crate::config::Config;
use crate::services::broadcast::BroadcastChannel;
use crate::services::room::RoomRegistry;
use crate::services::storage::StorageGateway;

/// Clone is required by Axum; all inner fields are Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageGateway>,
    pub rooms: RoomRegistry,
    pub channel: BroadcastChannel,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>, config: Config) -> Self {
        let rooms = RoomRegistry::new();
        let channel = BroadcastChannel::new(rooms.clone());
        Self { storage, rooms, channel, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_is_shared_with_broadcast_channel() {
        let state = test_helpers::test_app_state();
        let (a, mut rx_a) = test_helpers::connect_session(&state, None).await;

        state.rooms.join(a, "desk");
        let sent = state
            .channel
            .broadcast_room("desk", &crate::frame::Envelope::room_accept("desk"))
            .await;

        assert_eq!(sent, 1);
        let env = test_helpers::recv_envelope(&mut rx_a).await;
        assert_eq!(env.action, "roomAccept");
    }

    #[test]
    fn separate_states_do_not_share_rooms() {
        let one = test_helpers::test_app_state();
        let two = test_helpers::test_app_state();
        let session = uuid::Uuid::new_v4();

        one.rooms.join(session, "desk");

        assert!(two.rooms.room_of(session).is_none());
    }
}
