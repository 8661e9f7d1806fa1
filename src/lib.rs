//! # codeshare
//!
//! Real-time synchronization engine for the collaborative code-sharing
//! client. Keeps a local projection of a room (live code buffer, snapshot
//! list, comment threads) consistent with the room server's STOMP event
//! stream, and sends local code edits back out.
//!
//! Modules are split the same way a UI client would split them: `net`
//! holds everything that touches the wire (transport, topics, payload
//! schemas, HTTP API, outbound publishing) and `state` holds the local
//! projection and the pure reducers that mutate it. [`sync::RoomSync`] ties
//! the two together on a single task.

pub mod config;
pub mod net;
pub mod notice;
pub mod state;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use notice::Notice;
pub use sync::{RoomSync, RoomSyncHandle, SyncEvent};
