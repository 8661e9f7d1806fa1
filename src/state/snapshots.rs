//! Snapshots and their comment threads.
//!
//! DESIGN
//! ======
//! `SnapshotList` is the only owner of the snapshot collection. It keeps two
//! invariants: ids are unique and non-empty, and a snapshot accepted from the
//! event stream always lands at index 0. A full load from the HTTP API is
//! sorted by `created_at`, newest first.
//!
//! Comments form a tree (`replies`). Lookups walk the whole tree so a reply
//! can be updated, resolved, or deleted the same way a top-level comment is.

#[cfg(test)]
#[path = "snapshots_test.rs"]
mod snapshots_test;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

/// A comment attached to a snapshot. `parent_comment_id == 0` marks a
/// top-level question. A missing or null `commentId` reads as 0 so one bad
/// comment does not fail a whole snapshot list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub comment_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub solved: bool,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub parent_comment_id: i64,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id != 0
    }
}

/// Only a top-level comment nobody has answered yet may be edited or
/// deleted locally. Live replies nest under their parent, so a parent stops
/// being editable the moment a reply to it arrives.
#[must_use]
pub fn can_edit(comment: &Comment) -> bool {
    !comment.is_reply() && comment.replies.is_empty()
}

/// An immutable, named copy of the code buffer plus its comments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub title: String,
    pub description: String,
    pub code: String,
    pub comments: Vec<Comment>,
}

// =============================================================================
// SNAPSHOT LIST
// =============================================================================

/// Newest-first snapshot collection with unique ids.
#[derive(Clone, Debug, Default)]
pub struct SnapshotList {
    items: Vec<Snapshot>,
}

impl SnapshotList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Snapshot] {
        &self.items
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|s| s.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Snapshot> {
        self.items.iter_mut().find(|s| s.id == id)
    }

    /// Insert at the head. Returns `false` (and leaves the list unchanged)
    /// for an empty or already-present id.
    pub fn prepend(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.id.is_empty() || self.contains(&snapshot.id) {
            return false;
        }
        self.items.insert(0, snapshot);
        true
    }

    /// Replace the whole collection with an authoritative load. Entries with
    /// an empty id are skipped, later duplicates are dropped, and the result
    /// is sorted newest first.
    pub fn replace_all(&mut self, snapshots: Vec<Snapshot>) {
        let mut items: Vec<Snapshot> = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if snapshot.id.is_empty() || items.iter().any(|s| s.id == snapshot.id) {
                continue;
            }
            items.push(snapshot);
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// =============================================================================
// COMMENT TREE
// =============================================================================

/// `true` if any comment in the tree has `comment_id`.
#[must_use]
pub fn contains_comment(comments: &[Comment], comment_id: i64) -> bool {
    comments
        .iter()
        .any(|c| c.comment_id == comment_id || contains_comment(&c.replies, comment_id))
}

/// Mutable reference to the comment with `comment_id`, anywhere in the tree.
pub fn find_comment_mut(comments: &mut [Comment], comment_id: i64) -> Option<&mut Comment> {
    for comment in comments.iter_mut() {
        if comment.comment_id == comment_id {
            return Some(comment);
        }
        if let Some(found) = find_comment_mut(&mut comment.replies, comment_id) {
            return Some(found);
        }
    }
    None
}

/// Remove the comment with `comment_id` (and its replies). Returns whether
/// anything was removed.
pub fn remove_comment(comments: &mut Vec<Comment>, comment_id: i64) -> bool {
    let before = comments.len();
    comments.retain(|c| c.comment_id != comment_id);
    if comments.len() != before {
        return true;
    }
    comments.iter_mut().any(|c| remove_comment(&mut c.replies, comment_id))
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Parse a server timestamp. Accepts RFC 3339 and the offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` form (read as UTC). Returns `None` for
/// anything else.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    let local = time::macros::format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(raw, local).ok().map(PrimitiveDateTime::assume_utc)
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
