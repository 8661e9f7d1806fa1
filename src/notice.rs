//! User-facing notifications emitted by the engine.

#[cfg(test)]
#[path = "notice_test.rs"]
mod notice_test;

use std::fmt;

use crate::net::types::CommentEventKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The room opened with a stored or fresh authorization.
    RoomEntered,
    /// The device has no authorization for this room yet.
    PasswordRequired,
    /// The password exchange failed; carries the server message.
    AuthorizationFailed(String),
    SnapshotCreated { title: String },
    SnapshotCreateFailed(String),
    Comment(CommentEventKind),
    VoteUpdated,
}

impl Notice {
    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::PasswordRequired => NoticeLevel::Info,
            Self::AuthorizationFailed(_) | Self::SnapshotCreateFailed(_) => NoticeLevel::Error,
            _ => NoticeLevel::Success,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomEntered => f.write_str("Entered the room."),
            Self::PasswordRequired => f.write_str("This room requires a password."),
            Self::AuthorizationFailed(reason) => write!(f, "Could not enter the room: {reason}"),
            Self::SnapshotCreated { title } => write!(f, "New snapshot created: {title}"),
            Self::SnapshotCreateFailed(reason) => write!(f, "Could not create snapshot: {reason}"),
            Self::Comment(kind) => f.write_str(comment_message(*kind)),
            Self::VoteUpdated => f.write_str("Vote results updated."),
        }
    }
}

fn comment_message(kind: CommentEventKind) -> &'static str {
    match kind {
        CommentEventKind::Created => "A new question was posted.",
        CommentEventKind::ReplyCreated => "A new answer was posted.",
        CommentEventKind::Updated => "A comment was edited.",
        CommentEventKind::Deleted => "A comment was deleted.",
        CommentEventKind::Resolved => "A comment was marked resolved.",
        CommentEventKind::Unresolved => "A comment was marked unresolved.",
        CommentEventKind::Unknown => "Questions were updated.",
    }
}
