//! Desk service — one handler per inbound desk action.
//!
//! DESIGN
//! ======
//! Handlers combine the room registry, the storage gateway and the broadcast
//! channel. Timing differs per action:
//! - `moveFile` broadcasts first, then persists in a spawned task.
//! - `renameFile` / `deleteFile` await storage, then broadcast whatever
//!   the answer.
//!
//! The socket loop awaits each handler before reading the next message, so
//! a session's storage-completing actions reach its desk in arrival order.
//! Only the position write of `moveFile` runs detached; its handler returns
//! the `JoinHandle` and the socket loop drops it.
//!
//! ERROR HANDLING
//! ==============
//! Storage errors are logged and never reported to clients. No retries, no
//! rollback of a broadcast that already went out.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::frame::{DeleteFile, Envelope, MoveFile, RenameFile};
use crate::services::room::SessionId;
use crate::state::AppState;

/// A connected client: its id and the display name it offered on connect.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_name: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(id: SessionId, user_name: Option<String>) -> Self {
        Self { id, user_name }
    }
}

/// Send the session the files of its current desk. Without a desk the list
/// is empty and storage is not consulted.
pub async fn initialize(state: &AppState, session: &Session) {
    let files = match state.rooms.room_of(session.id) {
        Some(room) => match state.storage.get_all_files(&room).await {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, session = %session.id, %room, "load desk files failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    state.channel.send_to(session.id, Envelope::init_files(&files)).await;
}

pub async fn join_room(state: &AppState, session: &Session, room: &str) {
    let members = state.rooms.join(session.id, room);
    info!(session = %session.id, %room, members = members.len(), "session joined desk");

    let announce = Envelope::join_announce(session.id, session.user_name.as_deref());
    state.channel.broadcast_room(room, &announce).await;
    state.channel.send_to(session.id, Envelope::room_accept(room)).await;
}

pub async fn move_file(state: &AppState, session: &Session, mv: MoveFile) -> JoinHandle<()> {
    state.channel.broadcast_to_room(session.id, &Envelope::move_file(&mv)).await;

    let storage = state.storage.clone();
    let session_id = session.id;
    tokio::spawn(async move {
        if let Err(e) = storage
            .set_file_position(mv.id, mv.position.left, mv.position.top)
            .await
        {
            error!(error = %e, session = %session_id, file_id = %mv.id, "persist file position failed");
        }
    })
}

pub async fn rename_file(state: &AppState, session: &Session, rename: RenameFile) {
    let room = state.rooms.room_of(session.id);
    if let Err(e) = state.storage.rename_file(rename.file_id, &rename.new_name).await {
        error!(error = %e, session = %session.id, file_id = %rename.file_id, "rename file failed");
    }
    if let Some(room) = room {
        let envelope = Envelope::rename_file(rename.file_id, &rename.new_name);
        state.channel.broadcast_room(&room, &envelope).await;
    }
}

pub async fn delete_file(state: &AppState, session: &Session, delete: DeleteFile) {
    let room = state.rooms.room_of(session.id);
    if let Err(e) = state.storage.delete_file(delete.file_id).await {
        error!(error = %e, session = %session.id, file_id = %delete.file_id, "delete file failed");
    }
    if let Some(room) = room {
        state
            .channel
            .broadcast_room(&room, &Envelope::delete_file(delete.file_id))
            .await;
    }
}

/// Drop the session from its desk and from delivery.
pub async fn disconnect(state: &AppState, session: &Session) {
    let room = state.rooms.leave(session.id);
    state.channel.detach(session.id).await;
    info!(session = %session.id, room = ?room, "session left desk");
}

#[cfg(test)]
#[path = "desk_test.rs"]
mod tests;
