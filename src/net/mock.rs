//! In-memory transport and room API that record every call.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use crate::net::api::{ApiError, RoomApi};
use crate::net::transport::{ConnectionState, InboundMessage, MessageSink, SubscriptionId, Transport, TransportError};
use crate::net::types::{NewSnapshot, RoomGrant};
use crate::state::snapshots::Snapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Subscribe(String),
    Unsubscribe(String),
    Publish { destination: String, body: String },
    Shutdown,
}

pub(crate) struct MockTransport {
    state: watch::Sender<ConnectionState>,
    calls: Mutex<Vec<Call>>,
    subscriptions: Mutex<BTreeMap<SubscriptionId, (String, MessageSink)>>,
    next_id: AtomicU64,
    fail_publish: AtomicBool,
}

impl MockTransport {
    pub(crate) fn new(initial: ConnectionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            calls: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            fail_publish: AtomicBool::new(false),
        }
    }

    /// Change connection state. Dropping the connection discards every
    /// subscription, like the real transport.
    pub(crate) fn set_state(&self, state: ConnectionState) {
        if state != ConnectionState::Connected {
            self.subscriptions.lock().expect("subscriptions").clear();
        }
        self.state.send_replace(state);
    }

    pub(crate) fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().expect("calls").clear();
    }

    pub(crate) fn publishes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Publish { destination, body } => Some((destination, body)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn subscribed_topics(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .expect("subscriptions")
            .values()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Deliver `body` to every subscriber of `topic`. Returns how many
    /// subscribers received it.
    pub(crate) fn deliver(&self, topic: &str, body: &str) -> usize {
        let subscriptions = self.subscriptions.lock().expect("subscriptions");
        subscriptions
            .values()
            .filter(|(t, _)| t == topic)
            .filter(|(t, sink)| sink.send(InboundMessage { topic: t.clone(), body: body.to_owned() }).is_ok())
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }

    fn connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn subscribe(&self, topic: &str, sink: MessageSink) -> Result<SubscriptionId, TransportError> {
        if !self.connected() {
            return Err(TransportError::NotConnected);
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions
            .lock()
            .expect("subscriptions")
            .insert(id, (topic.to_owned(), sink));
        self.record(Call::Subscribe(topic.to_owned()));
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError> {
        let removed = self.subscriptions.lock().expect("subscriptions").remove(&id);
        let topic = removed.map(|(topic, _)| topic).unwrap_or_default();
        self.record(Call::Unsubscribe(topic));
        Ok(())
    }

    async fn publish(&self, destination: &str, body: String) -> Result<(), TransportError> {
        if !self.connected() {
            return Err(TransportError::NotConnected);
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Socket("mock publish failure".to_owned()));
        }
        self.record(Call::Publish { destination: destination.to_owned(), body });
        Ok(())
    }

    async fn shutdown(&self) {
        self.record(Call::Shutdown);
        self.set_state(ConnectionState::Disconnected);
    }
}

// =============================================================================
// ROOM API
// =============================================================================

#[derive(Default)]
pub(crate) struct MockRoomApi {
    password: Mutex<Option<String>>,
    grant: Mutex<Option<RoomGrant>>,
    snapshots: Mutex<Vec<Snapshot>>,
    fail_create: AtomicBool,
    created: Mutex<Vec<(String, NewSnapshot)>>,
    fetches: AtomicU64,
}

impl MockRoomApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accept `password` and answer with `grant`.
    pub(crate) fn with_grant(password: &str, grant: RoomGrant) -> Self {
        let api = Self::default();
        *api.password.lock().expect("password") = Some(password.to_owned());
        *api.grant.lock().expect("grant") = Some(grant);
        api
    }

    pub(crate) fn set_snapshots(&self, snapshots: Vec<Snapshot>) {
        *self.snapshots.lock().expect("snapshots") = snapshots;
    }

    pub(crate) fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn created(&self) -> Vec<(String, NewSnapshot)> {
        self.created.lock().expect("created").clone()
    }

    pub(crate) fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RoomApi for MockRoomApi {
    async fn authorize(&self, _room_uuid: &str, password: &str) -> Result<RoomGrant, ApiError> {
        let expected = self.password.lock().expect("password").clone();
        if expected.as_deref() != Some(password) {
            return Err(ApiError::Rejected("wrong password".to_owned()));
        }
        self.grant
            .lock()
            .expect("grant")
            .clone()
            .ok_or(ApiError::MissingData)
    }

    async fn fetch_snapshots(&self, _room_uuid: &str) -> Result<Vec<Snapshot>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshots.lock().expect("snapshots").clone())
    }

    async fn create_snapshot(&self, room_uuid: &str, snapshot: &NewSnapshot) -> Result<(), ApiError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("snapshot title required".to_owned()));
        }
        self.created
            .lock()
            .expect("created")
            .push((room_uuid.to_owned(), snapshot.clone()));
        Ok(())
    }
}
