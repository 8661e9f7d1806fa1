use super::*;

// =============================================================================
// Code events
// =============================================================================

#[test]
fn code_update_parses() {
    let event = parse_event(Category::Code, r#"{"eventType":"UPDATE","code":"x=1"}"#).expect("parse");
    assert_eq!(event, InboundEvent::Code(CodeEvent::Update { code: "x=1".to_owned() }));
}

#[test]
fn code_unknown_event_type_is_unknown_variant() {
    let event = parse_event(Category::Code, r#"{"eventType":"CURSOR","line":3}"#).expect("parse");
    assert_eq!(event, InboundEvent::Code(CodeEvent::Unknown));
}

#[test]
fn code_without_event_type_is_malformed() {
    assert!(parse_event(Category::Code, r#"{"code":"x"}"#).is_err());
    assert!(parse_event(Category::Code, "not json").is_err());
}

// =============================================================================
// Snapshot events
// =============================================================================

#[test]
fn snapshot_event_converts_to_model() {
    let body = r#"{
        "roomId": 12,
        "snapshot": {
            "snapshotId": "s1",
            "createdAt": "2025-03-01T10:00:00",
            "title": "First",
            "description": "desc",
            "code": "print(1)"
        }
    }"#;
    let InboundEvent::Snapshot(event) = parse_event(Category::Snapshots, body).expect("parse") else {
        panic!("expected snapshot event");
    };
    assert!(event.has_room());
    let snapshot = event.snapshot.and_then(SnapshotPayload::into_snapshot).expect("snapshot");
    assert_eq!(snapshot.id, "s1");
    assert_eq!(snapshot.title, "First");
    assert!(snapshot.comments.is_empty());
    assert_eq!(snapshot.created_at.unix_timestamp(), 1_740_823_200);
}

#[test]
fn snapshot_numeric_id_becomes_string() {
    let payload: SnapshotPayload = serde_json::from_str(r#"{"snapshotId":77}"#).expect("parse");
    assert_eq!(payload.snapshot_id.as_deref(), Some("77"));
}

#[test]
fn snapshot_without_id_does_not_convert() {
    let payload: SnapshotPayload = serde_json::from_str(r#"{"title":"no id"}"#).expect("parse");
    assert!(payload.into_snapshot().is_none());
    let payload: SnapshotPayload = serde_json::from_str(r#"{"snapshotId":""}"#).expect("parse");
    assert!(payload.into_snapshot().is_none());
}

#[test]
fn snapshot_event_room_presence() {
    let event: SnapshotEvent = serde_json::from_str(r#"{"snapshot":{"snapshotId":"a"}}"#).expect("parse");
    assert!(!event.has_room());
    let event: SnapshotEvent = serde_json::from_str(r#"{"roomId":"","snapshot":null}"#).expect("parse");
    assert!(!event.has_room());
    assert!(event.snapshot.is_none());
}

// =============================================================================
// Comment events
// =============================================================================

#[test]
fn comment_created_parses_with_flattened_tag() {
    let body = r#"{"snapshotId":"s1","eventType":"COMMENT_CREATED","comment":{"commentId":5,"content":"why?"}}"#;
    let InboundEvent::Comment(envelope) = parse_event(Category::Comments, body).expect("parse") else {
        panic!("expected comment event");
    };
    assert_eq!(envelope.snapshot_id, "s1");
    assert_eq!(envelope.event.kind(), CommentEventKind::Created);
    let CommentEvent::CommentCreated { comment } = envelope.event else {
        panic!("expected created");
    };
    assert_eq!(comment.comment_id, 5);
    assert_eq!(comment.parent_comment_id, 0);
}

#[test]
fn comment_deleted_reads_top_level_comment_id() {
    let body = r#"{"snapshotId":9,"eventType":"COMMENT_DELETED","commentId":5}"#;
    let envelope: CommentEnvelope = serde_json::from_str(body).expect("parse");
    assert_eq!(envelope.snapshot_id, "9");
    assert_eq!(envelope.event, CommentEvent::CommentDeleted { comment_id: Some(5), comment: None });
}

#[test]
fn comment_unknown_event_type_is_unknown_variant() {
    let body = r#"{"snapshotId":"s1","eventType":"COMMENT_PINNED"}"#;
    let envelope: CommentEnvelope = serde_json::from_str(body).expect("parse");
    assert_eq!(envelope.event, CommentEvent::Unknown);
}

#[test]
fn comment_without_snapshot_id_is_malformed() {
    let body = r#"{"eventType":"COMMENT_CREATED","comment":{"commentId":1}}"#;
    assert!(serde_json::from_str::<CommentEnvelope>(body).is_err());
}

// =============================================================================
// Votes / outbound / HTTP
// =============================================================================

#[test]
fn vote_accepts_any_json() {
    let event = parse_event(Category::Votes, r#"{"snapshotId":"s1","agree":3}"#).expect("parse");
    assert!(matches!(event, InboundEvent::Vote(_)));
    assert!(parse_event(Category::Votes, "{").is_err());
}

#[test]
fn code_update_serializes_camel_case() {
    let body = serde_json::to_value(CodeUpdate { room_id: 12, code: "x".to_owned() }).expect("serialize");
    assert_eq!(body, serde_json::json!({ "roomId": 12, "code": "x" }));
}

#[test]
fn room_grant_accepts_string_room_id() {
    let grant: RoomGrant = serde_json::from_str(r#"{"roomId":"12","title":"T"}"#).expect("parse");
    assert_eq!(grant, RoomGrant { room_id: 12, title: "T".to_owned() });
}

#[test]
fn envelope_without_data_is_none() {
    let envelope: ApiEnvelope<RoomGrant> = serde_json::from_str(r#"{"error":"wrong password"}"#).expect("parse");
    assert!(envelope.data.is_none());
    assert_eq!(envelope.error.as_deref(), Some("wrong password"));
}
