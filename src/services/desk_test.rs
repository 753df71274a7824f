use super::*;
use std::sync::Arc;

use uuid::Uuid;

use crate::frame::Position;
use crate::state::test_helpers::{
    FailingStorage, assert_no_envelope, connect_session, new_file, recv_envelope, test_app_state,
    test_app_state_with_storage,
};

fn session(id: SessionId) -> Session {
    Session::new(id, Some("tester".into()))
}

#[tokio::test]
async fn initialize_without_room_sends_empty_list() {
    let state = test_app_state();
    let (a, mut rx_a) = connect_session(&state, None).await;

    initialize(&state, &session(a)).await;

    let env = recv_envelope(&mut rx_a).await;
    assert_eq!(env.action, "initFiles");
    assert_eq!(env.data, serde_json::json!([]));
}

#[tokio::test]
async fn initialize_sends_desk_files_to_requester_only() {
    let state = test_app_state();
    let record = state.storage.create_file("desk", new_file("a.txt", "g")).await.unwrap();
    state.storage.create_file("other", new_file("b.txt", "g")).await.unwrap();
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;
    let (_b, mut rx_b) = connect_session(&state, Some("desk")).await;

    initialize(&state, &session(a)).await;

    let env = recv_envelope(&mut rx_a).await;
    let files = env.data.as_array().expect("file list");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], serde_json::json!(record.id));
    assert_no_envelope(&mut rx_b).await;
}

#[tokio::test]
async fn initialize_storage_failure_sends_empty_list() {
    let state = test_app_state_with_storage(Arc::new(FailingStorage));
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;

    initialize(&state, &session(a)).await;

    assert_eq!(recv_envelope(&mut rx_a).await.data, serde_json::json!([]));
}

#[tokio::test]
async fn join_announces_then_accepts() {
    let state = test_app_state();
    let (a, mut rx_a) = connect_session(&state, None).await;
    let (_b, mut rx_b) = connect_session(&state, Some("desk")).await;

    join_room(&state, &session(a), "desk").await;

    let first = recv_envelope(&mut rx_a).await;
    assert_eq!(first.action, "join-announce");
    assert_eq!(first.data["sessionId"], serde_json::json!(a));
    assert_eq!(first.data["userName"], "tester");
    assert_eq!(recv_envelope(&mut rx_a).await.action, "roomAccept");
    assert_no_envelope(&mut rx_a).await;

    assert_eq!(recv_envelope(&mut rx_b).await.action, "join-announce");
    assert_no_envelope(&mut rx_b).await;
}

#[tokio::test]
async fn move_broadcasts_then_persists() {
    let state = test_app_state();
    let record = state.storage.create_file("desk", new_file("a", "g")).await.unwrap();
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;

    let mv = MoveFile { id: record.id, position: Position { left: 120, top: 45 } };
    let persisted = move_file(&state, &session(a), mv).await;

    let env = recv_envelope(&mut rx_a).await;
    assert_eq!(env.action, "moveFile");
    assert_eq!(env.data["position"], serde_json::json!({"left": 120, "top": 45}));

    persisted.await.expect("persist task");
    let stored = state.storage.get_file(record.id).await.unwrap().unwrap();
    assert_eq!((stored.x, stored.y), (120, 45));
}

#[tokio::test]
async fn move_storage_failure_keeps_broadcast() {
    let state = test_app_state_with_storage(Arc::new(FailingStorage));
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;

    let mv = MoveFile { id: Uuid::new_v4(), position: Position { left: 1, top: 2 } };
    move_file(&state, &session(a), mv).await.await.expect("persist task");

    assert_eq!(recv_envelope(&mut rx_a).await.action, "moveFile");
}

#[tokio::test]
async fn rename_persists_then_broadcasts() {
    let state = test_app_state();
    let record = state.storage.create_file("desk", new_file("old", "g")).await.unwrap();
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;

    let rename = RenameFile { file_id: record.id, new_name: "new".into() };
    rename_file(&state, &session(a), rename).await;

    let env = recv_envelope(&mut rx_a).await;
    assert_eq!(env.action, "renameFile");
    assert_eq!(env.data["fileId"], serde_json::json!(record.id));
    assert_eq!(env.data["newName"], "new");
    assert_eq!(state.storage.get_file(record.id).await.unwrap().unwrap().name, "new");
}

#[tokio::test]
async fn rename_and_delete_broadcast_despite_storage_failure() {
    let state = test_app_state_with_storage(Arc::new(FailingStorage));
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;
    let file_id = Uuid::new_v4();

    rename_file(&state, &session(a), RenameFile { file_id, new_name: "n".into() }).await;
    delete_file(&state, &session(a), DeleteFile { file_id }).await;

    assert_eq!(recv_envelope(&mut rx_a).await.action, "renameFile");
    let deleted = recv_envelope(&mut rx_a).await;
    assert_eq!(deleted.action, "deleteFile");
    assert_eq!(deleted.data["fileId"], serde_json::json!(file_id));
}

#[tokio::test]
async fn delete_removes_record_and_reaches_whole_desk() {
    let state = test_app_state();
    let record = state.storage.create_file("desk", new_file("a", "g")).await.unwrap();
    let (a, mut rx_a) = connect_session(&state, Some("desk")).await;
    let (_b, mut rx_b) = connect_session(&state, Some("desk")).await;
    let (_c, mut rx_c) = connect_session(&state, Some("elsewhere")).await;

    delete_file(&state, &session(a), DeleteFile { file_id: record.id }).await;

    assert_eq!(recv_envelope(&mut rx_a).await.action, "deleteFile");
    assert_eq!(recv_envelope(&mut rx_b).await.action, "deleteFile");
    assert_no_envelope(&mut rx_c).await;
    assert!(state.storage.get_file(record.id).await.unwrap().is_none());
}

#[tokio::test]
async fn disconnect_evicts_session_from_room() {
    let state = test_app_state();
    let (a, _rx_a) = connect_session(&state, Some("desk")).await;
    let (b, _rx_b) = connect_session(&state, Some("desk")).await;

    disconnect(&state, &session(a)).await;

    assert!(state.rooms.room_of(a).is_none());
    assert_eq!(state.rooms.members_of("desk"), std::collections::HashSet::from([b]));
    assert!(!state.channel.send_to(a, Envelope::room_accept("desk")).await);
}
