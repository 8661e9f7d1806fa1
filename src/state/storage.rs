//! Per-device room map: room uuid → `{uuid, roomId, title, isAuthorized, lastAccessed}`.
//!
//! DESIGN
//! ======
//! The map is only used to skip the password prompt for rooms this device
//! has already entered. `JsonFileRoomStorage` keeps it in one JSON object on
//! disk (the same shape the browser client kept in local storage);
//! `MemoryRoomStorage` backs tests and throwaway sessions.
//!
//! ERROR HANDLING
//! ==============
//! A missing file is an empty map. A corrupt file is an error on read, but
//! [`RoomStorage::has_access`] turns any error into "no access" so the user
//! is simply prompted again.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

/// Errors from reading or writing the room map.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("room storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid room map.
    #[error("room storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("room storage lock poisoned")]
    Poisoned,
}

/// One stored room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRoom {
    pub uuid: String,
    pub room_id: i64,
    pub title: String,
    #[serde(default)]
    pub is_authorized: bool,
    #[serde(default)]
    pub last_accessed: Option<String>,
}

impl StoredRoom {
    /// Record stamped with the current time as `last_accessed`.
    #[must_use]
    pub fn new(uuid: &str, room_id: i64, title: &str, is_authorized: bool) -> Self {
        Self {
            uuid: uuid.to_owned(),
            room_id,
            title: title.to_owned(),
            is_authorized,
            last_accessed: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
        }
    }
}

pub type RoomMap = BTreeMap<String, StoredRoom>;

/// Key-value store of rooms this device has entered.
pub trait RoomStorage: Send + Sync {
    /// Every stored room keyed by uuid.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be read.
    fn rooms(&self) -> Result<RoomMap, StorageError>;

    /// Insert or replace the record for `room.uuid`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be written.
    fn save_room(&self, room: StoredRoom) -> Result<(), StorageError>;

    /// The stored record for `uuid`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be read.
    fn room(&self, uuid: &str) -> Result<Option<StoredRoom>, StorageError> {
        Ok(self.rooms()?.remove(uuid))
    }

    /// Whether this device was already authorized for `uuid`.
    fn has_access(&self, uuid: &str) -> bool {
        match self.room(uuid) {
            Ok(room) => room.is_some_and(|r| r.is_authorized),
            Err(error) => {
                warn!(room = %uuid, %error, "room storage unreadable; treating as no access");
                false
            }
        }
    }
}

// =============================================================================
// JSON FILE
// =============================================================================

/// Room map persisted as a single JSON object.
#[derive(Debug, Clone)]
pub struct JsonFileRoomStorage {
    path: PathBuf,
}

impl JsonFileRoomStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoomStorage for JsonFileRoomStorage {
    fn rooms(&self) -> Result<RoomMap, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(RoomMap::new()),
            Err(error) => return Err(error.into()),
        };
        if raw.trim().is_empty() {
            return Ok(RoomMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_room(&self, room: StoredRoom) -> Result<(), StorageError> {
        let mut rooms = self.rooms()?;
        rooms.insert(room.uuid.clone(), room);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(&rooms)?;
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Room map held in memory.
#[derive(Debug, Default)]
pub struct MemoryRoomStorage {
    rooms: Mutex<RoomMap>,
}

impl MemoryRoomStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `rooms`.
    #[must_use]
    pub fn with_rooms(rooms: impl IntoIterator<Item = StoredRoom>) -> Self {
        let map = rooms.into_iter().map(|r| (r.uuid.clone(), r)).collect();
        Self { rooms: Mutex::new(map) }
    }
}

impl RoomStorage for MemoryRoomStorage {
    fn rooms(&self) -> Result<RoomMap, StorageError> {
        self.rooms.lock().map(|r| r.clone()).map_err(|_| StorageError::Poisoned)
    }

    fn save_room(&self, room: StoredRoom) -> Result<(), StorageError> {
        let mut rooms = self.rooms.lock().map_err(|_| StorageError::Poisoned)?;
        rooms.insert(room.uuid.clone(), room);
        Ok(())
    }
}
