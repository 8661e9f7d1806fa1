//! Wire payload schemas for the room topics and HTTP API.
//!
//! DESIGN
//! ======
//! Each topic category has a closed event type. Event kinds travel as an
//! `eventType` string tag; serde maps the known tags to variants and every
//! other tag to an explicit `Unknown` variant, so reducers match
//! exhaustively and a new kind is a compile-time change here.
//!
//! Ids arrive as strings or numbers depending on the server build, so id
//! fields accept both.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};

use crate::net::topics::Category;
use crate::state::snapshots::{Comment, Snapshot, parse_timestamp};

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// Message on the code topic.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeEvent {
    /// The live buffer was replaced.
    Update { code: String },
    #[serde(other)]
    Unknown,
}

/// Message on the snapshots topic.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEvent {
    #[serde(default)]
    pub snapshot: Option<SnapshotPayload>,
    #[serde(default)]
    pub room_id: Option<serde_json::Value>,
}

impl SnapshotEvent {
    /// `true` if the event names a room (non-null, non-empty).
    #[must_use]
    pub fn has_room(&self) -> bool {
        match &self.room_id {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// A snapshot as the server sends it, on the topic and from `GET snapshots`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    #[serde(default, deserialize_with = "flexible_id")]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
}

impl SnapshotPayload {
    /// Convert to the local model. `None` when the id is missing or empty.
    /// An unparseable `createdAt` becomes the Unix epoch so the entry sorts
    /// last instead of being lost.
    #[must_use]
    pub fn into_snapshot(self) -> Option<Snapshot> {
        let id = self.snapshot_id.filter(|id| !id.is_empty())?;
        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(time::OffsetDateTime::UNIX_EPOCH);
        Some(Snapshot {
            id,
            created_at,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            code: self.code.unwrap_or_default(),
            comments: self.comments.unwrap_or_default(),
        })
    }
}

/// Message on the comments topic: the target snapshot plus the event.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEnvelope {
    #[serde(deserialize_with = "required_id")]
    pub snapshot_id: String,
    #[serde(flatten)]
    pub event: CommentEvent,
}

/// Comment event kinds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentEvent {
    CommentCreated {
        comment: Comment,
    },
    ReplyCreated {
        comment: Comment,
    },
    CommentUpdated {
        comment: Comment,
    },
    CommentDeleted {
        #[serde(default, rename = "commentId")]
        comment_id: Option<i64>,
        #[serde(default)]
        comment: Option<Comment>,
    },
    CommentResolved {
        comment: Comment,
    },
    CommentUnresolved {
        comment: Comment,
    },
    #[serde(other)]
    Unknown,
}

impl CommentEvent {
    /// Payload-free kind, used for notices and logs.
    #[must_use]
    pub fn kind(&self) -> CommentEventKind {
        match self {
            Self::CommentCreated { .. } => CommentEventKind::Created,
            Self::ReplyCreated { .. } => CommentEventKind::ReplyCreated,
            Self::CommentUpdated { .. } => CommentEventKind::Updated,
            Self::CommentDeleted { .. } => CommentEventKind::Deleted,
            Self::CommentResolved { .. } => CommentEventKind::Resolved,
            Self::CommentUnresolved { .. } => CommentEventKind::Unresolved,
            Self::Unknown => CommentEventKind::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentEventKind {
    Created,
    ReplyCreated,
    Updated,
    Deleted,
    Resolved,
    Unresolved,
    Unknown,
}

/// Message on the votes topic. The tally itself is opaque to the client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VoteEvent(pub serde_json::Value);

/// A parsed message from any room topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Code(CodeEvent),
    Snapshot(SnapshotEvent),
    Comment(CommentEnvelope),
    Vote(VoteEvent),
}

/// Parse a topic message body for `category`.
///
/// # Errors
///
/// Returns the JSON error if the body does not match the category schema.
pub fn parse_event(category: Category, body: &str) -> Result<InboundEvent, serde_json::Error> {
    Ok(match category {
        Category::Code => InboundEvent::Code(serde_json::from_str(body)?),
        Category::Snapshots => InboundEvent::Snapshot(serde_json::from_str(body)?),
        Category::Comments => InboundEvent::Comment(serde_json::from_str(body)?),
        Category::Votes => InboundEvent::Vote(serde_json::from_str(body)?),
    })
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Body sent to `/app/update.code`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeUpdate {
    pub room_id: i64,
    pub code: String,
}

// =============================================================================
// HTTP
// =============================================================================

/// `{ data?, error? }` wrapper used by every HTTP response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Result of a successful password exchange.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomGrant {
    #[serde(deserialize_with = "numeric_id")]
    pub room_id: i64,
    #[serde(default)]
    pub title: String,
}

/// Body of `POST /api/rooms/{uuid}/snapshots`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSnapshot {
    pub room_id: i64,
    pub title: String,
    pub description: String,
    pub code: String,
}

// =============================================================================
// ID HELPERS
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = RawId::deserialize(deserializer)?.into_string();
    if id.is_empty() {
        return Err(serde::de::Error::custom("empty id"));
    }
    Ok(id)
}

fn numeric_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
