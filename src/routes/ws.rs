//! WebSocket handler — desk session relay and action dispatch.
//!
//! DESIGN
//! ======
//! On upgrade, generates a session ID, attaches an outbound queue to the
//! broadcast channel, and enters a `select!` loop:
//! - Incoming text → parse into a `Command` → dispatch to the desk service
//! - Queued envelopes (replies and room broadcasts) → forward to the client
//!
//! Handlers never write to the socket. Replies to the sender go through the
//! same queue as broadcasts, so the client sees one ordered stream.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → attach queue under a fresh session id
//! 2. Client frames are dispatched strictly in arrival order
//! 3. Close or socket error → leave room, detach queue

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Command, Envelope};
use crate::services::desk::{self, Session};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_name = params.get("name").filter(|n| !n.is_empty()).cloned();
    ws.on_upgrade(move |socket| run_ws(socket, state, user_name))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_name: Option<String>) {
    let session = Session::new(Uuid::new_v4(), user_name);

    let (client_tx, mut client_rx) = mpsc::channel::<Envelope>(state.config.session_queue_capacity);
    state.channel.attach(session.id, client_tx).await;

    info!(session = %session.id, user_name = ?session.user_name, "ws: session connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => process_inbound_text(&state, &session, text.as_str()).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(envelope) = client_rx.recv() => {
                if send_envelope(&mut socket, &envelope).await.is_err() {
                    break;
                }
            }
        }
    }

    desk::disconnect(&state, &session).await;
    info!(session = %session.id, "ws: session disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse one inbound text message and run its handler.
///
/// Kept free of socket types so tests can drive dispatch through plain
/// channels.
pub(crate) async fn process_inbound_text(state: &AppState, session: &Session, text: &str) {
    let command = match Command::parse(text) {
        Ok(command) => command,
        Err(e) => {
            warn!(session = %session.id, error = %e, "ws: dropping inbound message");
            return;
        }
    };

    info!(session = %session.id, action = command.action(), "ws: recv");

    match command {
        Command::InitializeMe => desk::initialize(state, session).await,
        Command::JoinRoom(room) => desk::join_room(state, session, &room).await,
        Command::MoveFile(mv) => {
            // Persistence is fire-and-forget.
            drop(desk::move_file(state, session, mv).await);
        }
        Command::RenameFile(rename) => desk::rename_file(state, session, rename).await,
        Command::DeleteFile(delete) => desk::delete_file(state, session, delete).await,
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_envelope(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), ()> {
    let json = match serde_json::to_string(envelope) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, action = %envelope.action, "ws: failed to serialize envelope");
            return Err(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
