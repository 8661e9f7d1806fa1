//! Local projection of a room.
//!
//! DESIGN
//! ======
//! State is split by concern (`session`, `snapshots`, `mode`, etc.) so the
//! reducers and the engine depend on small focused models. Nothing here
//! performs I/O except `storage`, and `session::authorize_room`, which only
//! touches the network through the `RoomApi` trait.

pub mod gate;
pub mod mode;
pub mod orphans;
pub mod reducer;
pub mod session;
pub mod snapshots;
pub mod storage;
