//! Connection gate: `ready = connected ∧ authorized ∧ room id known`.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use crate::state::session::RoomSession;

/// Compute readiness from its three inputs.
#[must_use]
pub fn is_ready(connected: bool, session: Option<&RoomSession>) -> bool {
    connected && session.is_some_and(|s| s.authorized && s.numeric_room_id.is_some())
}

/// Remembers the last readiness so callers can react to transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionGate {
    ready: bool,
}

impl ConnectionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Recompute from current inputs. Returns `Some(new)` when readiness
    /// changed.
    pub fn update(&mut self, connected: bool, session: Option<&RoomSession>) -> Option<bool> {
        let ready = is_ready(connected, session);
        if ready == self.ready {
            return None;
        }
        self.ready = ready;
        Some(ready)
    }
}
