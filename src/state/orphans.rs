//! Comment events that arrived before their snapshot.
//!
//! Topics are not ordered against each other, so a comment can reach the
//! client before the snapshot it belongs to. Those events wait here, bounded
//! by count and age, and are replayed in arrival order once the snapshot is
//! accepted. The oldest entry is evicted when the buffer is full.

#[cfg(test)]
#[path = "orphans_test.rs"]
mod orphans_test;

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::net::types::CommentEnvelope;

#[derive(Debug)]
pub struct OrphanBuffer {
    capacity: usize,
    ttl: Duration,
    entries: VecDeque<(Instant, CommentEnvelope)>,
}

impl OrphanBuffer {
    /// `capacity == 0` disables buffering.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl, entries: VecDeque::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hold `envelope`. Returns `false` when buffering is disabled.
    pub fn push(&mut self, envelope: CommentEnvelope, now: Instant) -> bool {
        if self.capacity == 0 {
            return false;
        }
        self.prune(now);
        while self.entries.len() >= self.capacity {
            if let Some((_, evicted)) = self.entries.pop_front() {
                debug!(snapshot = %evicted.snapshot_id, "orphan comment evicted");
            }
        }
        self.entries.push_back((now, envelope));
        true
    }

    /// Remove and return every live entry for `snapshot_id`, oldest first.
    pub fn take_for(&mut self, snapshot_id: &str, now: Instant) -> Vec<CommentEnvelope> {
        self.prune(now);
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for (at, envelope) in self.entries.drain(..) {
            if envelope.snapshot_id == snapshot_id {
                taken.push(envelope);
            } else {
                kept.push_back((at, envelope));
            }
        }
        self.entries = kept;
        taken
    }

    /// Drop entries older than the TTL. Returns how many were dropped.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|(at, envelope)| {
            let live = now.saturating_duration_since(*at) < ttl;
            if !live {
                debug!(snapshot = %envelope.snapshot_id, "orphan comment expired");
            }
            live
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
