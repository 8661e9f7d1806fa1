//! Outbound code publishing.
//!
//! DESIGN
//! ======
//! A local edit goes through two checks. [`admit_edit`] decides whether the
//! edit may change the live buffer at all (live mode, different text).
//! [`Publisher::submit`] then decides when the accepted edit goes out: at
//! once by default, or at the trailing edge of a coalescing window with the
//! latest text winning. Readiness is checked by the caller right before the
//! send; an edit made while not ready is never queued.

#[cfg(test)]
#[path = "publisher_test.rs"]
mod publisher_test;

use std::time::Duration;

use tokio::time::Instant;

use crate::net::types::CodeUpdate;
use crate::state::mode::DisplayMode;

/// Why a local edit was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditRejection {
    /// A snapshot is displayed; code is read-only.
    ReadOnly,
    /// The text equals what is already displayed.
    Unchanged,
}

/// Gate a local edit on display mode and change detection.
///
/// # Errors
///
/// Returns the [`EditRejection`] reason when the edit must be ignored.
pub fn admit_edit(mode: DisplayMode, current: &str, proposed: &str) -> Result<(), EditRejection> {
    if mode.is_read_only() {
        return Err(EditRejection::ReadOnly);
    }
    if current == proposed {
        return Err(EditRejection::Unchanged);
    }
    Ok(())
}

/// Serialize an update for `/app/update.code`.
///
/// # Errors
///
/// Returns the JSON error if serialization fails.
pub fn encode_update(update: &CodeUpdate) -> Result<String, serde_json::Error> {
    serde_json::to_string(update)
}

/// Holds at most one pending update when coalescing is on.
#[derive(Debug, Default)]
pub struct Publisher {
    window: Option<Duration>,
    pending: Option<CodeUpdate>,
    deadline: Option<Instant>,
}

impl Publisher {
    /// `window = None` publishes every edit immediately.
    #[must_use]
    pub fn new(window: Option<Duration>) -> Self {
        Self { window, pending: None, deadline: None }
    }

    #[must_use]
    pub fn is_coalescing(&self) -> bool {
        self.window.is_some()
    }

    /// Offer an update. Returns it back when it should be sent now;
    /// otherwise it replaces any pending update and is sent by
    /// [`Publisher::take_due`] once the window closes.
    pub fn submit(&mut self, update: CodeUpdate, now: Instant) -> Option<CodeUpdate> {
        let Some(window) = self.window else {
            return Some(update);
        };
        self.pending = Some(update);
        if self.deadline.is_none() {
            self.deadline = Some(now + window);
        }
        None
    }

    /// When the pending update is due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the pending update if its window has closed.
    pub fn take_due(&mut self, now: Instant) -> Option<CodeUpdate> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop any pending update.
    pub fn discard(&mut self) -> Option<CodeUpdate> {
        self.deadline = None;
        self.pending.take()
    }
}
