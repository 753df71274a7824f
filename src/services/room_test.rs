use super::*;

#[test]
fn join_places_session_in_room() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();

    let members = rooms.join(a, "desk");

    assert_eq!(members, HashSet::from([a]));
    assert_eq!(rooms.room_of(a).as_deref(), Some("desk"));
}

#[test]
fn join_returns_snapshot_of_all_members() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    rooms.join(a, "desk");
    let members = rooms.join(b, "desk");

    assert_eq!(members, HashSet::from([a, b]));
}

#[test]
fn join_same_room_twice_is_idempotent() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();

    rooms.join(a, "desk");
    rooms.join(a, "desk");

    assert_eq!(rooms.members_of("desk"), HashSet::from([a]));
    assert_eq!(rooms.room_of(a).as_deref(), Some("desk"));
}

#[test]
fn switching_rooms_removes_from_previous() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    rooms.join(a, "first");
    rooms.join(b, "first");
    rooms.join(a, "second");

    assert_eq!(rooms.members_of("first"), HashSet::from([b]));
    assert_eq!(rooms.members_of("second"), HashSet::from([a]));
    assert_eq!(rooms.room_of(a).as_deref(), Some("second"));
}

#[test]
fn leave_removes_membership_and_reports_room() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();

    rooms.join(a, "desk");
    assert_eq!(rooms.leave(a).as_deref(), Some("desk"));

    assert!(rooms.room_of(a).is_none());
    assert!(rooms.members_of("desk").is_empty());
}

#[test]
fn leave_without_room_is_noop() {
    let rooms = RoomRegistry::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    rooms.join(b, "desk");

    assert!(rooms.leave(a).is_none());
    assert_eq!(rooms.members_of("desk"), HashSet::from([b]));
}

#[test]
fn members_of_unknown_room_is_empty() {
    let rooms = RoomRegistry::new();
    assert!(rooms.members_of("nowhere").is_empty());
}

#[test]
fn clones_share_state() {
    let rooms = RoomRegistry::new();
    let other = rooms.clone();
    let a = Uuid::new_v4();

    other.join(a, "desk");

    assert_eq!(rooms.room_of(a).as_deref(), Some("desk"));
}

#[test]
fn most_recent_join_wins_across_many_sessions() {
    let rooms = RoomRegistry::new();
    let sessions: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let names = ["red", "green", "blue"];

    // Deterministic interleaving of joins; track the expected final room.
    let mut expected: HashMap<Uuid, &str> = HashMap::new();
    for step in 0..40usize {
        let session = sessions[step % sessions.len()];
        let room = names[(step * 7 + step / 3) % names.len()];
        rooms.join(session, room);
        expected.insert(session, room);
    }

    for session in &sessions {
        let room = expected[session];
        assert_eq!(rooms.room_of(*session).as_deref(), Some(room));
        for name in names {
            let contains = rooms.members_of(name).contains(session);
            assert_eq!(contains, name == room, "session {session} membership in {name}");
        }
    }
}
