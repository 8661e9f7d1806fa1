//! Room topic naming and the per-category subscription registry.
//!
//! DESIGN
//! ======
//! Each of the four categories has one slot. [`TopicRegistry::sync`] is given
//! the session the gate currently allows (or `None`) and moves every slot to
//! the desired topic: unsubscribe the old one first, then subscribe the new
//! one. Slots are independent, so a failed subscribe leaves the slot empty
//! for the next sync and does not affect the others.
//!
//! Inbound routing goes through [`TopicRegistry::category_of`], which only
//! recognises currently subscribed topics. Messages that were already queued
//! for a torn-down topic are dropped there.

#[cfg(test)]
#[path = "topics_test.rs"]
mod topics_test;

use std::fmt;

use tracing::{debug, info, warn};

use crate::net::transport::{MessageSink, SubscriptionId, Transport};
use crate::state::session::RoomSession;

/// Send destination for live code edits.
pub const CODE_DESTINATION: &str = "/app/update.code";

/// Event categories, one topic each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Code,
    Snapshots,
    Comments,
    Votes,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Code, Self::Snapshots, Self::Comments, Self::Votes];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Snapshots => "snapshots",
            Self::Comments => "comments",
            Self::Votes => "votes",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Code => 0,
            Self::Snapshots => 1,
            Self::Comments => 2,
            Self::Votes => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic for `category` in `session`. The code topic is keyed by the
/// numeric room id, so it is `None` until that id is known.
#[must_use]
pub fn topic_for(category: Category, session: &RoomSession) -> Option<String> {
    match category {
        Category::Code => session
            .numeric_room_id
            .map(|id| format!("/topic/room/{id}/code")),
        other => Some(format!("/topic/room/{}/{}", session.room_uuid, other.as_str())),
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    topic: Option<String>,
    subscription: Option<SubscriptionId>,
}

/// At most one live subscription per category.
#[derive(Clone, Debug, Default)]
pub struct TopicRegistry {
    slots: [Slot; 4],
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently subscribed topic for `category`.
    #[must_use]
    pub fn topic(&self, category: Category) -> Option<&str> {
        let slot = &self.slots[category.slot()];
        slot.subscription.and(slot.topic.as_deref())
    }

    /// All currently subscribed topics, in category order.
    #[must_use]
    pub fn active_topics(&self) -> Vec<&str> {
        Category::ALL.iter().filter_map(|c| self.topic(*c)).collect()
    }

    /// Category a message on `topic` belongs to, if that topic is live.
    #[must_use]
    pub fn category_of(&self, topic: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| self.topic(*c) == Some(topic))
    }

    /// Move every slot to the topic `desired` calls for. `None` tears all
    /// subscriptions down.
    pub async fn sync(&mut self, transport: &dyn Transport, desired: Option<&RoomSession>, sink: &MessageSink) {
        for category in Category::ALL {
            let want = desired.and_then(|session| topic_for(category, session));
            self.sync_slot(transport, category, want, sink).await;
        }
    }

    /// Empty every slot without unsubscribing. For when the transport has
    /// already discarded its subscriptions.
    pub fn forget(&mut self) {
        self.slots = <[Slot; 4]>::default();
    }

    /// Unsubscribe everything.
    pub async fn teardown(&mut self, transport: &dyn Transport, sink: &MessageSink) {
        self.sync(transport, None, sink).await;
    }

    async fn sync_slot(
        &mut self,
        transport: &dyn Transport,
        category: Category,
        want: Option<String>,
        sink: &MessageSink,
    ) {
        let slot = &mut self.slots[category.slot()];
        if slot.subscription.is_some() && slot.topic == want {
            return;
        }

        if let Some(id) = slot.subscription.take() {
            let topic = slot.topic.take().unwrap_or_default();
            match transport.unsubscribe(id).await {
                Ok(()) => info!(%category, %topic, subscription = %id, "unsubscribed"),
                Err(error) => debug!(%category, %topic, %error, "unsubscribe skipped"),
            }
        }
        slot.topic = None;

        let Some(topic) = want else {
            return;
        };
        match transport.subscribe(&topic, sink.clone()).await {
            Ok(id) => {
                info!(%category, %topic, subscription = %id, "subscribed");
                slot.topic = Some(topic);
                slot.subscription = Some(id);
            }
            Err(error) => {
                warn!(%category, %topic, %error, "subscribe failed");
            }
        }
    }
}
