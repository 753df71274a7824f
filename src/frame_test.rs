use super::*;

#[test]
fn parse_initialize_without_data() {
    let cmd = Command::parse(r#"{"action":"initializeMe"}"#).expect("parse");
    assert_eq!(cmd, Command::InitializeMe);
}

#[test]
fn parse_join_room_takes_string_payload() {
    let cmd = Command::parse(r#"{"action":"joinRoom","data":"team-desk"}"#).expect("parse");
    assert_eq!(cmd, Command::JoinRoom("team-desk".into()));
}

#[test]
fn parse_move_file_payload() {
    let id = Uuid::new_v4();
    let text = json!({"action": "moveFile", "data": {"id": id, "position": {"left": 40, "top": -3}}}).to_string();
    let cmd = Command::parse(&text).expect("parse");
    assert_eq!(cmd, Command::MoveFile(MoveFile { id, position: Position { left: 40, top: -3 } }));
    assert_eq!(cmd.action(), "moveFile");
}

#[test]
fn parse_rename_uses_camel_case_fields() {
    let id = Uuid::new_v4();
    let text = json!({"action": "renameFile", "data": {"fileId": id, "newName": "notes.txt"}}).to_string();
    let Command::RenameFile(rename) = Command::parse(&text).expect("parse") else {
        panic!("expected rename");
    };
    assert_eq!(rename.file_id, id);
    assert_eq!(rename.new_name, "notes.txt");
}

#[test]
fn missing_action_is_rejected() {
    assert!(matches!(Command::parse(r#"{"data":{}}"#), Err(ProtocolError::MissingAction)));
    assert!(matches!(Command::parse(r#"{"action":42}"#), Err(ProtocolError::MissingAction)));
    assert!(matches!(Command::parse(r#"{"action":""}"#), Err(ProtocolError::MissingAction)));
}

#[test]
fn unknown_action_is_rejected() {
    let err = Command::parse(r#"{"action":"doesNotExist","data":{}}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownAction(ref a) if a == "doesNotExist"));
}

#[test]
fn malformed_payload_names_action() {
    let err = Command::parse(r#"{"action":"deleteFile","data":{"fileId":"not-a-uuid"}}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidPayload { action: "deleteFile", .. }));
}

#[test]
fn non_json_is_rejected() {
    assert!(matches!(Command::parse("hello"), Err(ProtocolError::InvalidJson(_))));
}

#[test]
fn outbound_move_echoes_position() {
    let mv = MoveFile { id: Uuid::new_v4(), position: Position { left: 10, top: 20 } };
    let env = Envelope::move_file(&mv);
    assert_eq!(env.action, "moveFile");
    assert_eq!(env.data["id"], json!(mv.id));
    assert_eq!(env.data["position"], json!({"left": 10, "top": 20}));
}

#[test]
fn join_announce_serializes_null_name() {
    let sid = Uuid::new_v4();
    let env = Envelope::join_announce(sid, None);
    let text = serde_json::to_string(&env).expect("serialize");
    let back: Envelope = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back.action, "join-announce");
    assert_eq!(back.data["sessionId"], json!(sid));
    assert!(back.data["userName"].is_null());
}

#[test]
fn fractional_position_is_rounded() {
    let id = Uuid::new_v4();
    let text = json!({"action": "moveFile", "data": {"id": id, "position": {"left": 40.6, "top": -3.2}}}).to_string();
    let cmd = Command::parse(&text).expect("parse");
    assert_eq!(cmd, Command::MoveFile(MoveFile { id, position: Position { left: 41, top: -3 } }));
}

#[test]
fn out_of_range_position_is_rejected() {
    let id = Uuid::new_v4();
    let text = json!({"action": "moveFile", "data": {"id": id, "position": {"left": 1e12, "top": 0}}}).to_string();
    assert!(matches!(
        Command::parse(&text),
        Err(ProtocolError::InvalidPayload { action: "moveFile", .. })
    ));
}
