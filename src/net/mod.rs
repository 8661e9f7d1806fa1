//! Wire-facing modules.
//!
//! DESIGN
//! ======
//! `transport` is the seam between the engine and any publish/subscribe
//! connection; `stomp_client` is the production implementation. `topics`,
//! `types`, and `publisher` describe what flows over that seam, and `api`
//! covers the HTTP side of a room.

pub mod api;
pub mod publisher;
pub mod stomp_client;
pub mod topics;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;
