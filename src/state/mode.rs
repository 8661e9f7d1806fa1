//! Display mode and side-panel state.
//!
//! DESIGN
//! ======
//! `DisplayMode` is the single source for read-only and panel availability.
//! `Snapshot(index)` always points at a valid entry of the snapshot list:
//! selection is range-checked, a prepend shifts the index by one so the same
//! snapshot stays on screen, and a reload re-resolves the index by id (or
//! falls back to `Live` if the snapshot is gone).

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use crate::state::snapshots::SnapshotList;

/// Which version of the code is on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Live,
    Snapshot(usize),
}

impl DisplayMode {
    #[must_use]
    pub fn is_read_only(self) -> bool {
        !matches!(self, Self::Live)
    }

    #[must_use]
    pub fn snapshot_index(self) -> Option<usize> {
        match self {
            Self::Live => None,
            Self::Snapshot(index) => Some(index),
        }
    }
}

/// Right-hand side panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    Snapshots,
    Questions,
    Voting,
}

impl Panel {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Snapshots => "snapshots",
            Self::Questions => "comments",
            Self::Voting => "voting",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Snapshots => "Snapshots",
            Self::Questions => "Questions",
            Self::Voting => "Voting",
        }
    }

    /// Questions and voting are scoped to a snapshot.
    #[must_use]
    pub fn needs_snapshot(self) -> bool {
        matches!(self, Self::Questions | Self::Voting)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModeController {
    mode: DisplayMode,
    open_panel: Option<Panel>,
}

impl ModeController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mode.is_read_only()
    }

    #[must_use]
    pub fn open_panel(&self) -> Option<Panel> {
        self.open_panel
    }

    /// Show snapshot `index`. No-op (returns `false`) when out of range.
    pub fn select_snapshot(&mut self, index: usize, snapshots: &SnapshotList) -> bool {
        if index >= snapshots.len() {
            return false;
        }
        self.mode = DisplayMode::Snapshot(index);
        true
    }

    /// Back to the live buffer; snapshot-scoped panels close.
    pub fn return_to_live(&mut self) {
        self.mode = DisplayMode::Live;
        if self.open_panel.is_some_and(Panel::needs_snapshot) {
            self.open_panel = None;
        }
    }

    /// Version picker: `None` returns to live, `Some(i)` selects a snapshot.
    pub fn change_version(&mut self, index: Option<usize>, snapshots: &SnapshotList) -> bool {
        match index {
            None => {
                self.return_to_live();
                true
            }
            Some(index) => self.select_snapshot(index, snapshots),
        }
    }

    #[must_use]
    pub fn panel_available(&self, panel: Panel) -> bool {
        !panel.needs_snapshot() || self.mode.is_read_only()
    }

    /// Open `panel`, or close it if it is already open. Returns the open
    /// panel afterwards. Unavailable panels close whatever is open.
    pub fn toggle_panel(&mut self, panel: Panel) -> Option<Panel> {
        self.open_panel = if !self.panel_available(panel) || self.open_panel == Some(panel) {
            None
        } else {
            Some(panel)
        };
        self.open_panel
    }

    pub fn close_panel(&mut self) {
        self.open_panel = None;
    }

    /// A snapshot was inserted at index 0.
    pub fn on_snapshot_prepended(&mut self) {
        if let DisplayMode::Snapshot(index) = self.mode {
            self.mode = DisplayMode::Snapshot(index + 1);
        }
    }

    /// Re-point the selection at `selected_id` after the list was replaced.
    /// Returns `false` if the mode fell back to `Live`.
    pub fn reconcile(&mut self, selected_id: Option<&str>, snapshots: &SnapshotList) -> bool {
        if self.mode == DisplayMode::Live {
            return true;
        }
        match selected_id.and_then(|id| snapshots.position(id)) {
            Some(index) => {
                self.mode = DisplayMode::Snapshot(index);
                true
            }
            None => {
                self.return_to_live();
                false
            }
        }
    }

    /// Back to the initial state (room closed).
    pub fn reset(&mut self) {
        self.mode = DisplayMode::Live;
        self.open_panel = None;
    }

    /// Text on screen for the current mode.
    #[must_use]
    pub fn display_code<'a>(&self, live: &'a str, snapshots: &'a SnapshotList) -> &'a str {
        match self.mode {
            DisplayMode::Live => live,
            DisplayMode::Snapshot(index) => snapshots.get(index).map_or(live, |s| s.code.as_str()),
        }
    }
}
