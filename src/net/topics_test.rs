use super::*;
use crate::net::mock::{Call, MockTransport};
use crate::net::transport::ConnectionState;

fn session(uuid: &str, room_id: Option<i64>) -> RoomSession {
    RoomSession {
        room_uuid: uuid.to_owned(),
        numeric_room_id: room_id,
        title: String::new(),
        authorized: true,
    }
}

fn sink() -> MessageSink {
    tokio::sync::mpsc::unbounded_channel().0
}

// =============================================================================
// Naming
// =============================================================================

#[test]
fn topic_names_follow_room_identity() {
    let s = session("abc", Some(12));
    assert_eq!(topic_for(Category::Code, &s).as_deref(), Some("/topic/room/12/code"));
    assert_eq!(topic_for(Category::Snapshots, &s).as_deref(), Some("/topic/room/abc/snapshots"));
    assert_eq!(topic_for(Category::Comments, &s).as_deref(), Some("/topic/room/abc/comments"));
    assert_eq!(topic_for(Category::Votes, &s).as_deref(), Some("/topic/room/abc/votes"));
}

#[test]
fn code_topic_needs_numeric_id() {
    assert_eq!(topic_for(Category::Code, &session("abc", None)), None);
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn sync_subscribes_every_category_once() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();
    let s = session("abc", Some(12));

    registry.sync(&transport, Some(&s), &sink()).await;
    registry.sync(&transport, Some(&s), &sink()).await;

    let subscribes = transport
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Subscribe(_)))
        .count();
    assert_eq!(subscribes, 4);
    assert_eq!(registry.active_topics().len(), 4);
    assert_eq!(registry.topic(Category::Code), Some("/topic/room/12/code"));
}

#[tokio::test]
async fn sync_none_tears_everything_down() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();
    registry.sync(&transport, Some(&session("abc", Some(12))), &sink()).await;

    registry.teardown(&transport, &sink()).await;

    assert!(registry.active_topics().is_empty());
    assert!(transport.subscribed_topics().is_empty());
    assert_eq!(registry.category_of("/topic/room/abc/votes"), None);
}

#[tokio::test]
async fn room_change_unsubscribes_before_subscribing() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();
    registry.sync(&transport, Some(&session("a", Some(1))), &sink()).await;
    transport.clear_calls();

    registry.sync(&transport, Some(&session("b", Some(2))), &sink()).await;

    let calls = transport.calls();
    assert_eq!(calls[0], Call::Unsubscribe("/topic/room/1/code".to_owned()));
    assert_eq!(calls[1], Call::Subscribe("/topic/room/2/code".to_owned()));
    let mut topics = transport.subscribed_topics();
    topics.sort();
    assert_eq!(
        topics,
        vec!["/topic/room/2/code", "/topic/room/b/comments", "/topic/room/b/snapshots", "/topic/room/b/votes"]
    );
}

#[tokio::test]
async fn failed_subscribe_leaves_slot_empty_and_retries() {
    let transport = MockTransport::new(ConnectionState::Disconnected);
    let mut registry = TopicRegistry::new();
    let s = session("abc", Some(12));

    registry.sync(&transport, Some(&s), &sink()).await;
    assert!(registry.active_topics().is_empty());

    transport.set_state(ConnectionState::Connected);
    registry.sync(&transport, Some(&s), &sink()).await;
    assert_eq!(registry.active_topics().len(), 4);
}

#[tokio::test]
async fn code_slot_waits_for_numeric_id_without_blocking_others() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();

    registry.sync(&transport, Some(&session("abc", None)), &sink()).await;

    assert_eq!(registry.topic(Category::Code), None);
    assert_eq!(registry.topic(Category::Votes), Some("/topic/room/abc/votes"));
}

#[tokio::test]
async fn category_of_only_matches_live_topics() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();
    registry.sync(&transport, Some(&session("abc", Some(12))), &sink()).await;

    assert_eq!(registry.category_of("/topic/room/abc/comments"), Some(Category::Comments));
    assert_eq!(registry.category_of("/topic/room/zzz/comments"), None);
}

#[tokio::test]
async fn forget_resubscribes_without_unsubscribing() {
    let transport = MockTransport::new(ConnectionState::Connected);
    let mut registry = TopicRegistry::new();
    let s = session("abc", Some(12));
    registry.sync(&transport, Some(&s), &sink()).await;

    registry.forget();
    assert!(registry.active_topics().is_empty());

    transport.clear_calls();
    registry.sync(&transport, Some(&s), &sink()).await;

    let calls = transport.calls();
    assert!(calls.iter().all(|c| matches!(c, Call::Subscribe(_))));
    assert_eq!(calls.len(), 4);
    assert_eq!(registry.active_topics().len(), 4);
}
