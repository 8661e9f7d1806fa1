//! Room session store and the live code buffer.
//!
//! DESIGN
//! ======
//! `RoomSessionStore` is a narrow cell: it is written by the entry flow
//! (restore from local storage, or a successful authorization exchange) and
//! read by the connection gate. Once a session is authorized it stays
//! authorized for as long as the same room is open.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tracing::{info, warn};

use crate::net::api::{ApiError, RoomApi};
use crate::net::types::RoomGrant;
use crate::state::storage::{RoomStorage, StoredRoom};

/// Identity and authorization of the open room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomSession {
    /// Public room identifier from the URL.
    pub room_uuid: String,
    /// Server-side numeric id, known after authorization.
    pub numeric_room_id: Option<i64>,
    pub title: String,
    pub authorized: bool,
}

impl RoomSession {
    /// Session for a room the device has not been authorized for yet.
    #[must_use]
    pub fn pending(room_uuid: impl Into<String>) -> Self {
        Self { room_uuid: room_uuid.into(), numeric_room_id: None, title: String::new(), authorized: false }
    }

    /// Session restored from a stored room record.
    #[must_use]
    pub fn from_stored(room: &StoredRoom) -> Self {
        Self {
            room_uuid: room.uuid.clone(),
            numeric_room_id: Some(room.room_id),
            title: room.title.clone(),
            authorized: room.is_authorized,
        }
    }
}

/// Holds at most one open room.
#[derive(Clone, Debug, Default)]
pub struct RoomSessionStore {
    current: Option<RoomSession>,
}

impl RoomSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&RoomSession> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn room_uuid(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.room_uuid.as_str())
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.authorized)
    }

    /// Open a room, replacing whatever was open before.
    pub fn open(&mut self, session: RoomSession) {
        self.current = Some(session);
    }

    /// Apply a successful authorization to the open room. Returns `false` if
    /// no room is open, the grant is for another room, or the session is
    /// already authorized.
    pub fn authorize(&mut self, room_uuid: &str, grant: &RoomGrant) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };
        if session.room_uuid != room_uuid || session.authorized {
            return false;
        }
        session.numeric_room_id = Some(grant.room_id);
        session.title.clone_from(&grant.title);
        session.authorized = true;
        true
    }

    pub fn close(&mut self) -> Option<RoomSession> {
        self.current.take()
    }
}

/// The single shared live buffer of a room.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveCode {
    text: String,
}

impl LiveCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Replace the buffer. Returns `false` if the text was already current.
    pub fn set(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        text.clone_into(&mut self.text);
        true
    }
}

// =============================================================================
// ENTRY FLOW
// =============================================================================

/// Run the password exchange for `room_uuid` and persist the grant so the
/// next visit skips the prompt.
///
/// A storage failure is logged and does not fail the entry: the grant is
/// still valid for this session.
///
/// # Errors
///
/// Returns the [`ApiError`] from the authorization request.
pub async fn authorize_room(
    api: &dyn RoomApi,
    storage: &dyn RoomStorage,
    room_uuid: &str,
    password: &str,
) -> Result<RoomGrant, ApiError> {
    let grant = api.authorize(room_uuid, password).await?;
    info!(room = %room_uuid, room_id = grant.room_id, "room authorized");

    let record = StoredRoom::new(room_uuid, grant.room_id, &grant.title, true);
    if let Err(error) = storage.save_room(record) {
        warn!(room = %room_uuid, %error, "failed to persist room authorization");
    }
    Ok(grant)
}
