use super::*;

fn room(uuid: &str, authorized: bool) -> StoredRoom {
    StoredRoom::new(uuid, 42, "Algorithms", authorized)
}

// =============================================================================
// StoredRoom
// =============================================================================

#[test]
fn stored_room_stamps_last_accessed() {
    let stored = room("r-1", true);
    let stamp = stored.last_accessed.expect("timestamp");
    assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
}

#[test]
fn stored_room_uses_browser_field_names() {
    let json = serde_json::to_value(room("r-1", true)).expect("serialize");
    assert_eq!(json["roomId"], 42);
    assert_eq!(json["isAuthorized"], true);
    assert!(json.get("lastAccessed").is_some());
}

#[test]
fn stored_room_missing_authorized_defaults_false() {
    let parsed: StoredRoom =
        serde_json::from_str(r#"{"uuid":"r","roomId":1,"title":"t"}"#).expect("parse");
    assert!(!parsed.is_authorized);
    assert!(parsed.last_accessed.is_none());
}

// =============================================================================
// MemoryRoomStorage
// =============================================================================

#[test]
fn memory_has_access_follows_authorized_flag() {
    let storage = MemoryRoomStorage::with_rooms([room("yes", true), room("no", false)]);
    assert!(storage.has_access("yes"));
    assert!(!storage.has_access("no"));
    assert!(!storage.has_access("unknown"));
}

#[test]
fn memory_save_replaces_existing_record() {
    let storage = MemoryRoomStorage::new();
    storage.save_room(room("r", false)).expect("save");
    storage.save_room(room("r", true)).expect("save");
    assert_eq!(storage.rooms().expect("rooms").len(), 1);
    assert!(storage.has_access("r"));
}

// =============================================================================
// JsonFileRoomStorage
// =============================================================================

#[test]
fn json_file_missing_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = JsonFileRoomStorage::new(dir.path().join("rooms.json"));
    assert!(storage.rooms().expect("rooms").is_empty());
    assert!(!storage.has_access("r"));
}

#[test]
fn json_file_round_trips_and_creates_parent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("rooms.json");
    let storage = JsonFileRoomStorage::new(&path);

    storage.save_room(room("a", true)).expect("save a");
    storage.save_room(room("b", false)).expect("save b");

    let reopened = JsonFileRoomStorage::new(&path);
    let rooms = reopened.rooms().expect("rooms");
    assert_eq!(rooms.len(), 2);
    assert_eq!(reopened.room("a").expect("room").map(|r| r.room_id), Some(42));
    assert!(reopened.has_access("a"));
    assert!(!reopened.has_access("b"));
}

#[test]
fn json_file_corrupt_is_error_but_no_access() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");
    std::fs::write(&path, "{not json").expect("write");
    let storage = JsonFileRoomStorage::new(&path);

    assert!(matches!(storage.rooms(), Err(StorageError::Corrupt(_))));
    assert!(!storage.has_access("a"));
}
