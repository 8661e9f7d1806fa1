//! Inbound event reducers, one per topic category.
//!
//! DESIGN
//! ======
//! Each reducer takes the state slice it owns plus a parsed event, applies
//! the event in place, and returns an outcome describing what happened. The
//! engine turns outcomes into notices, refetches, and orphan buffering;
//! reducers never touch the network.
//!
//! Every reducer is idempotent under replay: a duplicate snapshot, a comment
//! that already exists, or a target that cannot be found leaves state
//! unchanged.

#[cfg(test)]
#[path = "reducer_test.rs"]
mod reducer_test;

use tracing::{debug, warn};

use crate::net::types::{CodeEvent, CommentEnvelope, CommentEvent, CommentEventKind, SnapshotEvent, VoteEvent};
use crate::state::session::LiveCode;
use crate::state::snapshots::{Comment, SnapshotList, contains_comment, find_comment_mut, remove_comment};

// =============================================================================
// CODE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeOutcome {
    /// The live buffer changed.
    Applied,
    /// The update matched the buffer (usually our own edit echoed back).
    Echo,
    /// Not an update event.
    Ignored,
}

pub fn reduce_code(live: &mut LiveCode, event: &CodeEvent) -> CodeOutcome {
    match event {
        CodeEvent::Update { code } => {
            if live.set(code) {
                CodeOutcome::Applied
            } else {
                CodeOutcome::Echo
            }
        }
        CodeEvent::Unknown => {
            debug!("ignoring code event of unknown type");
            CodeOutcome::Ignored
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Inserted at the head of the list.
    Accepted { id: String, title: String },
    /// A snapshot with this id is already present; first seen wins.
    Duplicate { id: String },
    /// The event carried no snapshot or no snapshot id.
    MissingId,
    /// The event did not name a room.
    MissingRoom,
}

pub fn reduce_snapshot(snapshots: &mut SnapshotList, event: SnapshotEvent) -> SnapshotOutcome {
    if !event.has_room() {
        warn!("snapshot event without room id dropped");
        return SnapshotOutcome::MissingRoom;
    }
    let Some(snapshot) = event.snapshot.and_then(|payload| payload.into_snapshot()) else {
        warn!("snapshot event without snapshot id dropped");
        return SnapshotOutcome::MissingId;
    };
    if snapshots.contains(&snapshot.id) {
        debug!(snapshot = %snapshot.id, "duplicate snapshot event dropped");
        return SnapshotOutcome::Duplicate { id: snapshot.id };
    }
    let id = snapshot.id.clone();
    let title = snapshot.title.clone();
    snapshots.prepend(snapshot);
    SnapshotOutcome::Accepted { id, title }
}

// =============================================================================
// COMMENT
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentOutcome {
    /// The snapshot's comments changed.
    Applied(CommentEventKind),
    /// No local snapshot has the event's `snapshotId`.
    SnapshotNotFound,
    /// The target comment does not exist in that snapshot.
    CommentNotFound,
    /// A create/reply for a comment that already exists.
    AlreadyPresent,
    /// Unknown event type, or a delete without any comment id.
    Ignored,
}

pub fn reduce_comment(snapshots: &mut SnapshotList, envelope: &CommentEnvelope) -> CommentOutcome {
    let kind = envelope.event.kind();
    if kind == CommentEventKind::Unknown {
        debug!(snapshot = %envelope.snapshot_id, "ignoring comment event of unknown type");
        return CommentOutcome::Ignored;
    }
    let Some(snapshot) = snapshots.find_mut(&envelope.snapshot_id) else {
        warn!(snapshot = %envelope.snapshot_id, ?kind, "comment event for unknown snapshot");
        return CommentOutcome::SnapshotNotFound;
    };
    let comments = &mut snapshot.comments;

    let outcome = match &envelope.event {
        CommentEvent::CommentCreated { comment } => insert_comment(comments, comment, false),
        CommentEvent::ReplyCreated { comment } => insert_comment(comments, comment, true),
        CommentEvent::CommentUpdated { comment } => match find_comment_mut(comments, comment.comment_id) {
            Some(target) => {
                target.content.clone_from(&comment.content);
                target.updated_at.clone_from(&comment.updated_at);
                true
            }
            None => false,
        },
        CommentEvent::CommentDeleted { comment_id, comment } => {
            let Some(id) = comment_id.or(comment.as_ref().map(|c| c.comment_id)) else {
                warn!(snapshot = %envelope.snapshot_id, "comment delete without id dropped");
                return CommentOutcome::Ignored;
            };
            remove_comment(comments, id)
        }
        CommentEvent::CommentResolved { comment } => set_solved(comments, comment.comment_id, comment.solved),
        CommentEvent::CommentUnresolved { comment } => set_solved(comments, comment.comment_id, false),
        CommentEvent::Unknown => return CommentOutcome::Ignored,
    };

    match (outcome, kind) {
        (true, _) => CommentOutcome::Applied(kind),
        (false, CommentEventKind::Created | CommentEventKind::ReplyCreated) => {
            debug!(snapshot = %envelope.snapshot_id, "comment already present");
            CommentOutcome::AlreadyPresent
        }
        (false, _) => {
            warn!(snapshot = %envelope.snapshot_id, ?kind, "comment event for unknown comment");
            CommentOutcome::CommentNotFound
        }
    }
}

/// Append a fresh copy of `incoming`. A reply goes under its parent when the
/// parent is present, otherwise at the top level. Returns `false` if the id
/// already exists anywhere in the thread.
fn insert_comment(comments: &mut Vec<Comment>, incoming: &Comment, reply: bool) -> bool {
    if contains_comment(comments, incoming.comment_id) {
        return false;
    }
    let fresh = Comment { updated_at: None, replies: Vec::new(), ..incoming.clone() };
    if reply && fresh.parent_comment_id != 0 {
        if let Some(parent) = find_comment_mut(comments, fresh.parent_comment_id) {
            parent.replies.push(fresh);
            return true;
        }
    }
    comments.push(fresh);
    true
}

fn set_solved(comments: &mut [Comment], comment_id: i64, solved: bool) -> bool {
    match find_comment_mut(comments, comment_id) {
        Some(target) => {
            target.solved = solved;
            true
        }
        None => false,
    }
}

// =============================================================================
// VOTE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Tallies live on the server; reload the snapshot list.
    Refetch,
}

/// Votes are not modelled locally; any vote event invalidates the list.
#[must_use]
pub fn reduce_vote(event: &VoteEvent) -> VoteOutcome {
    debug!(payload = %event.0, "vote event");
    VoteOutcome::Refetch
}
