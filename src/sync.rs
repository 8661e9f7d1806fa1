//! Room synchronization engine.
//!
//! DESIGN
//! ======
//! [`RoomSync`] is the session root. It owns every piece of room state (the
//! session store, live buffer, snapshot list, display mode, orphan buffer,
//! outbound publisher) and runs on a single task, so each inbound event,
//! local command, or fetch result is applied as one indivisible step.
//!
//! Readiness flows one way: transport state + session -> [`ConnectionGate`]
//! -> [`TopicRegistry`]. Every input change calls `refresh_gate`, which
//! re-derives readiness and moves the four topic subscriptions to match.
//!
//! Inbound messages arrive on one channel shared by all subscriptions and
//! are routed by topic. A message for a topic that is no longer subscribed
//! is dropped, so late deliveries from a previous room never land.
//!
//! Snapshot list fetches run as spawned tasks and report back on a channel.
//! A result whose room differs from the open room is stale and discarded.
//!
//! ERROR HANDLING
//! ==============
//! Transport, parse, and invalid-event failures are logged and leave state
//! as it was. Only authorization and snapshot-creation failures reach the
//! user, as [`Notice`] events.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::net::api::{ApiError, RoomApi};
use crate::net::publisher::{Publisher, admit_edit, encode_update};
use crate::net::topics::{CODE_DESTINATION, TopicRegistry};
use crate::net::transport::{ConnectionState, InboundMessage, MessageSink, Transport};
use crate::net::types::{CodeUpdate, CommentEnvelope, InboundEvent, NewSnapshot, SnapshotEvent, parse_event};
use crate::notice::Notice;
use crate::state::gate::ConnectionGate;
use crate::state::mode::{DisplayMode, ModeController, Panel};
use crate::state::orphans::OrphanBuffer;
use crate::state::reducer::{
    CodeOutcome, CommentOutcome, SnapshotOutcome, VoteOutcome, reduce_code, reduce_comment, reduce_snapshot,
    reduce_vote,
};
use crate::state::session::{LiveCode, RoomSession, RoomSessionStore, authorize_room};
use crate::state::snapshots::{Snapshot, SnapshotList};
use crate::state::storage::{RoomStorage, StoredRoom};

/// What the engine reports to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    Connection(ConnectionState),
    /// The gate opened or closed.
    Ready(bool),
    /// The live buffer changed because of a remote update.
    CodeChanged(String),
    /// The snapshot list or a comment thread changed.
    SnapshotsChanged { count: usize },
    ModeChanged(DisplayMode),
    Notice(Notice),
}

/// Commands accepted by a spawned engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncCommand {
    OpenRoom(String),
    EnterRoom { password: String },
    CloseRoom,
    EditCode(String),
    SelectSnapshot(usize),
    ReturnToLive,
    ChangeVersion(Option<usize>),
    TogglePanel(Panel),
    CreateSnapshot { title: String, description: String },
    Shutdown,
}

/// Why a snapshot fetch was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchReason {
    RoomOpened,
    VoteChanged,
}

struct FetchDone {
    room_uuid: String,
    reason: FetchReason,
    /// Length of `RoomSync::accepted` when the request was issued.
    accepted_mark: usize,
    result: Result<Vec<Snapshot>, ApiError>,
}

pub struct RoomSync {
    transport: Arc<dyn Transport>,
    api: Arc<dyn RoomApi>,
    storage: Arc<dyn RoomStorage>,

    connection: watch::Receiver<ConnectionState>,
    connected: bool,

    sessions: RoomSessionStore,
    gate: ConnectionGate,
    topics: TopicRegistry,
    live: LiveCode,
    snapshots: SnapshotList,
    /// Ids accepted from the snapshots topic, in arrival order.
    accepted: Vec<String>,
    mode: ModeController,
    orphans: OrphanBuffer,
    publisher: Publisher,

    inbound_tx: MessageSink,
    inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
    fetch_tx: mpsc::UnboundedSender<FetchDone>,
    fetch_rx: mpsc::UnboundedReceiver<FetchDone>,
    fetches_in_flight: usize,

    events: mpsc::UnboundedSender<SyncEvent>,
}

impl RoomSync {
    /// Build an engine over the given collaborators. Nothing is subscribed
    /// until a room is opened and the gate becomes ready.
    #[must_use]
    pub fn new(
        config: &SyncConfig,
        transport: Arc<dyn Transport>,
        api: Arc<dyn RoomApi>,
        storage: Arc<dyn RoomStorage>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let mut connection = transport.connection();
        let connected = *connection.borrow_and_update() == ConnectionState::Connected;
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let sync = Self {
            transport,
            api,
            storage,
            connection,
            connected,
            sessions: RoomSessionStore::new(),
            gate: ConnectionGate::new(),
            topics: TopicRegistry::new(),
            live: LiveCode::default(),
            snapshots: SnapshotList::new(),
            accepted: Vec::new(),
            mode: ModeController::new(),
            orphans: OrphanBuffer::new(config.orphan_capacity, config.orphan_ttl),
            publisher: Publisher::new(config.publish_coalesce),
            inbound_tx,
            inbound_rx,
            fetch_tx,
            fetch_rx,
            fetches_in_flight: 0,
            events,
        };
        (sync, events_rx)
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> Option<&RoomSession> {
        self.sessions.current()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    #[must_use]
    pub fn live_code(&self) -> &str {
        self.live.as_str()
    }

    #[must_use]
    pub fn snapshots(&self) -> &SnapshotList {
        &self.snapshots
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode.mode()
    }

    #[must_use]
    pub fn open_panel(&self) -> Option<Panel> {
        self.mode.open_panel()
    }

    /// Code on screen: the live buffer, or the selected snapshot's code.
    #[must_use]
    pub fn display_code(&self) -> &str {
        self.mode.display_code(self.live.as_str(), &self.snapshots)
    }

    #[must_use]
    pub fn active_topics(&self) -> Vec<&str> {
        self.topics.active_topics()
    }

    // =========================================================================
    // ROOM LIFECYCLE
    // =========================================================================

    /// Open `room_uuid`. A stored authorization restores the session and
    /// skips the password prompt; otherwise the room waits for
    /// [`RoomSync::enter_room`].
    pub async fn open_room(&mut self, room_uuid: &str) {
        self.reset_room_state();

        let stored = if self.storage.has_access(room_uuid) {
            match self.storage.room(room_uuid) {
                Ok(room) => room,
                Err(error) => {
                    warn!(room = %room_uuid, %error, "stored room unreadable");
                    None
                }
            }
        } else {
            None
        };

        match stored {
            Some(room) => {
                info!(room = %room_uuid, room_id = room.room_id, "restored stored room authorization");
                self.sessions.open(RoomSession::from_stored(&room));
                self.touch_stored_room(&room);
                self.emit(SyncEvent::Notice(Notice::RoomEntered));
            }
            None => {
                info!(room = %room_uuid, "room needs password");
                self.sessions.open(RoomSession::pending(room_uuid));
                self.emit(SyncEvent::Notice(Notice::PasswordRequired));
            }
        }

        self.refresh_gate().await;
        self.request_snapshots(FetchReason::RoomOpened);
    }

    /// Run the password exchange for the open room. Returns `true` if the
    /// room is authorized afterwards.
    pub async fn enter_room(&mut self, password: &str) -> bool {
        let Some(room_uuid) = self.sessions.room_uuid().map(ToOwned::to_owned) else {
            warn!("enter_room without an open room");
            return false;
        };
        if self.sessions.is_authorized() {
            return true;
        }

        match authorize_room(self.api.as_ref(), self.storage.as_ref(), &room_uuid, password).await {
            Ok(grant) => {
                self.sessions.authorize(&room_uuid, &grant);
                self.emit(SyncEvent::Notice(Notice::RoomEntered));
                self.refresh_gate().await;
                self.request_snapshots(FetchReason::RoomOpened);
                true
            }
            Err(error) => {
                warn!(room = %room_uuid, %error, "room authorization failed");
                self.emit(SyncEvent::Notice(Notice::AuthorizationFailed(error.to_string())));
                false
            }
        }
    }

    /// Close the open room and drop every subscription.
    pub async fn close_room(&mut self) {
        if let Some(session) = self.sessions.close() {
            info!(room = %session.room_uuid, "room closed");
        }
        self.reset_room_state();
        self.refresh_gate().await;
    }

    fn reset_room_state(&mut self) {
        if self.publisher.discard().is_some() {
            debug!("pending code update dropped on room change");
        }
        self.live = LiveCode::default();
        self.snapshots.clear();
        self.accepted.clear();
        self.orphans.clear();
        if self.mode.mode() != DisplayMode::Live || self.mode.open_panel().is_some() {
            self.mode.reset();
            self.emit(SyncEvent::ModeChanged(DisplayMode::Live));
        }
    }

    fn touch_stored_room(&self, room: &StoredRoom) {
        let refreshed = StoredRoom::new(&room.uuid, room.room_id, &room.title, room.is_authorized);
        if let Err(error) = self.storage.save_room(refreshed) {
            warn!(room = %room.uuid, %error, "failed to update last access");
        }
    }

    // =========================================================================
    // LOCAL ACTIONS
    // =========================================================================

    /// Apply a local edit to the live buffer and publish it when ready.
    /// Returns `false` if the edit was rejected (read-only or unchanged).
    pub async fn edit_code(&mut self, code: &str) -> bool {
        if let Err(rejection) = admit_edit(self.mode.mode(), self.live.as_str(), code) {
            debug!(?rejection, "local edit ignored");
            return false;
        }
        self.live.set(code);

        let Some(room_id) = self.ready_room_id() else {
            debug!("not ready; local edit not published");
            return true;
        };
        let update = CodeUpdate { room_id, code: code.to_owned() };
        if let Some(update) = self.publisher.submit(update, Instant::now()) {
            self.send_update(update).await;
        }
        true
    }

    /// Show snapshot `index` read-only. Out-of-range is a no-op.
    pub fn select_snapshot(&mut self, index: usize) -> bool {
        let before = self.mode.mode();
        let selected = self.mode.select_snapshot(index, &self.snapshots);
        if !selected {
            debug!(index, count = self.snapshots.len(), "snapshot index out of range");
        }
        self.emit_mode_if_changed(before);
        selected
    }

    pub fn return_to_live(&mut self) {
        let before = self.mode.mode();
        self.mode.return_to_live();
        self.emit_mode_if_changed(before);
    }

    /// Version picker: `None` is live, `Some(i)` a snapshot.
    pub fn change_version(&mut self, index: Option<usize>) -> bool {
        let before = self.mode.mode();
        let changed = self.mode.change_version(index, &self.snapshots);
        self.emit_mode_if_changed(before);
        changed
    }

    pub fn toggle_panel(&mut self, panel: Panel) -> Option<Panel> {
        self.mode.toggle_panel(panel)
    }

    /// Ask the server to freeze the live buffer as a new snapshot. The
    /// snapshot itself arrives on the snapshots topic.
    pub async fn create_snapshot(&mut self, title: &str, description: &str) -> bool {
        let Some((room_uuid, room_id)) = self
            .sessions
            .current()
            .filter(|s| s.authorized)
            .and_then(|s| s.numeric_room_id.map(|id| (s.room_uuid.clone(), id)))
        else {
            self.emit(SyncEvent::Notice(Notice::SnapshotCreateFailed("room is not ready".to_owned())));
            return false;
        };
        if self.live.as_str().trim().is_empty() {
            self.emit(SyncEvent::Notice(Notice::SnapshotCreateFailed("code is empty".to_owned())));
            return false;
        }

        let request = NewSnapshot {
            room_id,
            title: title.to_owned(),
            description: description.to_owned(),
            code: self.live.as_str().to_owned(),
        };
        match self.api.create_snapshot(&room_uuid, &request).await {
            Ok(()) => {
                info!(room = %room_uuid, title, "snapshot requested");
                true
            }
            Err(error) => {
                warn!(room = %room_uuid, %error, "snapshot creation failed");
                self.emit(SyncEvent::Notice(Notice::SnapshotCreateFailed(error.to_string())));
                false
            }
        }
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    fn ready_room_id(&self) -> Option<i64> {
        if !self.gate.is_ready() {
            return None;
        }
        self.sessions.current().and_then(|s| s.numeric_room_id)
    }

    async fn send_update(&self, update: CodeUpdate) {
        let body = match encode_update(&update) {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "code update not serializable");
                return;
            }
        };
        match self.transport.publish(CODE_DESTINATION, body).await {
            Ok(()) => debug!(room_id = update.room_id, bytes = update.code.len(), "code published"),
            Err(error) => warn!(room_id = update.room_id, %error, "code publish failed"),
        }
    }

    /// Send the coalesced update whose window closed at or before `now`.
    async fn flush_due(&mut self, now: Instant) {
        let Some(update) = self.publisher.take_due(now) else {
            return;
        };
        if self.ready_room_id().is_none() {
            debug!("not ready; coalesced edit dropped");
            return;
        }
        self.send_update(update).await;
    }

    // =========================================================================
    // GATE
    // =========================================================================

    /// React to a transport state change.
    pub async fn handle_connection(&mut self, state: ConnectionState) {
        let connected = state == ConnectionState::Connected;
        if connected != self.connected {
            info!(?state, "transport connection changed");
        }
        self.connected = connected;
        self.emit(SyncEvent::Connection(state));
        self.refresh_gate().await;
    }

    /// Read the transport state after a change notification. Reading
    /// `Connected` while already connected means a drop and reconnect went
    /// unobserved in between: the transport discarded every subscription,
    /// so the registry's ids are dead.
    async fn observe_connection(&mut self) {
        let state = *self.connection.borrow_and_update();
        if state == ConnectionState::Connected && self.connected {
            info!("transport reconnected between observations; resubscribing");
            self.topics.forget();
        }
        self.handle_connection(state).await;
    }

    async fn refresh_gate(&mut self) {
        if let Some(ready) = self.gate.update(self.connected, self.sessions.current()) {
            info!(ready, room = ?self.sessions.room_uuid(), "sync readiness changed");
            if !ready && self.publisher.discard().is_some() {
                debug!("pending code update dropped; not ready");
            }
            self.emit(SyncEvent::Ready(ready));
        }
        let desired = if self.gate.is_ready() { self.sessions.current() } else { None };
        self.topics
            .sync(self.transport.as_ref(), desired, &self.inbound_tx)
            .await;
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Route one message to its reducer.
    pub fn handle_inbound(&mut self, message: InboundMessage) {
        let Some(category) = self.topics.category_of(&message.topic) else {
            debug!(topic = %message.topic, "message for inactive topic dropped");
            return;
        };
        let event = match parse_event(category, &message.body) {
            Ok(event) => event,
            Err(error) => {
                warn!(%category, %error, "malformed payload dropped");
                return;
            }
        };

        match event {
            InboundEvent::Code(event) => {
                if reduce_code(&mut self.live, &event) == CodeOutcome::Applied {
                    self.emit(SyncEvent::CodeChanged(self.live.as_str().to_owned()));
                }
            }
            InboundEvent::Snapshot(event) => self.apply_snapshot(event),
            InboundEvent::Comment(envelope) => self.apply_comment(envelope, Instant::now()),
            InboundEvent::Vote(event) => match reduce_vote(&event) {
                VoteOutcome::Refetch => self.request_snapshots(FetchReason::VoteChanged),
            },
        }
    }

    fn apply_snapshot(&mut self, event: SnapshotEvent) {
        let SnapshotOutcome::Accepted { id, title } = reduce_snapshot(&mut self.snapshots, event) else {
            return;
        };
        info!(snapshot = %id, "snapshot added");
        self.accepted.push(id.clone());
        let before = self.mode.mode();
        self.mode.on_snapshot_prepended();
        self.emit_mode_if_changed(before);
        self.emit(SyncEvent::SnapshotsChanged { count: self.snapshots.len() });
        self.emit(SyncEvent::Notice(Notice::SnapshotCreated { title }));
        self.replay_orphans(&id, Instant::now());
    }

    fn apply_comment(&mut self, envelope: CommentEnvelope, now: Instant) {
        match reduce_comment(&mut self.snapshots, &envelope) {
            CommentOutcome::Applied(kind) => {
                self.emit(SyncEvent::SnapshotsChanged { count: self.snapshots.len() });
                self.emit(SyncEvent::Notice(Notice::Comment(kind)));
            }
            CommentOutcome::SnapshotNotFound => {
                let snapshot = envelope.snapshot_id.clone();
                if self.orphans.push(envelope, now) {
                    debug!(%snapshot, held = self.orphans.len(), "comment held until snapshot arrives");
                }
            }
            CommentOutcome::CommentNotFound | CommentOutcome::AlreadyPresent | CommentOutcome::Ignored => {}
        }
    }

    fn replay_orphans(&mut self, snapshot_id: &str, now: Instant) {
        let held = self.orphans.take_for(snapshot_id, now);
        if held.is_empty() {
            return;
        }
        debug!(snapshot = %snapshot_id, count = held.len(), "replaying held comments");
        for envelope in held {
            self.apply_comment(envelope, now);
        }
    }

    // =========================================================================
    // SNAPSHOT FETCH
    // =========================================================================

    fn request_snapshots(&mut self, reason: FetchReason) {
        let Some(room_uuid) = self
            .sessions
            .current()
            .filter(|s| s.authorized)
            .map(|s| s.room_uuid.clone())
        else {
            return;
        };
        self.fetches_in_flight += 1;
        let accepted_mark = self.accepted.len();
        debug!(room = %room_uuid, ?reason, in_flight = self.fetches_in_flight, "fetching snapshot list");

        let api = Arc::clone(&self.api);
        let results = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_snapshots(&room_uuid).await;
            let _ = results.send(FetchDone { room_uuid, reason, accepted_mark, result });
        });
    }

    fn handle_fetch(&mut self, done: FetchDone) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        if self.sessions.room_uuid() != Some(done.room_uuid.as_str()) {
            debug!(room = %done.room_uuid, "stale snapshot list dropped");
            return;
        }
        let mut list = match done.result {
            Ok(list) => list,
            Err(error) => {
                warn!(room = %done.room_uuid, %error, "snapshot list fetch failed");
                return;
            }
        };

        let before = self.mode.mode();
        let selected = before
            .snapshot_index()
            .and_then(|i| self.snapshots.get(i))
            .map(|s| s.id.clone());
        // A snapshot accepted while the request was in flight may be missing
        // from a list the server built before it existed.
        for id in self.accepted.get(done.accepted_mark..).unwrap_or_default() {
            if list.iter().any(|s| &s.id == id) {
                continue;
            }
            if let Some(snapshot) = self.snapshots.iter().find(|s| &s.id == id) {
                debug!(snapshot = %id, "keeping snapshot newer than the fetched list");
                list.push(snapshot.clone());
            }
        }
        self.snapshots.replace_all(list);
        if !self.mode.reconcile(selected.as_deref(), &self.snapshots) {
            info!(snapshot = ?selected, "selected snapshot no longer listed; back to live");
        }
        self.emit_mode_if_changed(before);

        let ids: Vec<String> = self.snapshots.iter().map(|s| s.id.clone()).collect();
        let now = Instant::now();
        for id in &ids {
            self.replay_orphans(id, now);
        }

        info!(room = %done.room_uuid, count = self.snapshots.len(), "snapshot list loaded");
        self.emit(SyncEvent::SnapshotsChanged { count: self.snapshots.len() });
        if done.reason == FetchReason::VoteChanged {
            self.emit(SyncEvent::Notice(Notice::VoteUpdated));
        }
    }

    // =========================================================================
    // RUN LOOP
    // =========================================================================

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }

    fn emit_mode_if_changed(&self, before: DisplayMode) {
        let after = self.mode.mode();
        if after != before {
            self.emit(SyncEvent::ModeChanged(after));
        }
    }

    async fn execute(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::OpenRoom(room_uuid) => self.open_room(&room_uuid).await,
            SyncCommand::EnterRoom { password } => {
                self.enter_room(&password).await;
            }
            SyncCommand::CloseRoom => self.close_room().await,
            SyncCommand::EditCode(code) => {
                self.edit_code(&code).await;
            }
            SyncCommand::SelectSnapshot(index) => {
                self.select_snapshot(index);
            }
            SyncCommand::ReturnToLive => self.return_to_live(),
            SyncCommand::ChangeVersion(index) => {
                self.change_version(index);
            }
            SyncCommand::TogglePanel(panel) => {
                self.toggle_panel(panel);
            }
            SyncCommand::CreateSnapshot { title, description } => {
                self.create_snapshot(&title, &description).await;
            }
            SyncCommand::Shutdown => {}
        }
    }

    /// Process transport changes, inbound messages, fetch results, and
    /// commands until `Shutdown` or every command sender is dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SyncCommand>) {
        let initial = *self.connection.borrow_and_update();
        self.handle_connection(initial).await;

        loop {
            let flush_at = self.publisher.deadline();
            tokio::select! {
                changed = self.connection.changed() => {
                    if changed.is_err() {
                        warn!("transport dropped its connection signal");
                        break;
                    }
                    self.observe_connection().await;
                }
                Some(message) = self.inbound_rx.recv() => self.handle_inbound(message),
                Some(done) = self.fetch_rx.recv() => self.handle_fetch(done),
                command = commands.recv() => match command {
                    None | Some(SyncCommand::Shutdown) => break,
                    Some(command) => self.execute(command).await,
                },
                () = sleep_until_opt(flush_at) => self.flush_due(Instant::now()).await,
            }
        }

        self.shutdown().await;
    }

    /// Flush any coalesced edit, drop subscriptions, and stop the transport.
    pub async fn shutdown(&mut self) {
        if let Some(deadline) = self.publisher.deadline() {
            self.flush_due(deadline).await;
        }
        self.topics
            .teardown(self.transport.as_ref(), &self.inbound_tx)
            .await;
        self.transport.shutdown().await;
        info!("sync engine stopped");
    }

    /// Run on a new task and return a command handle.
    #[must_use]
    pub fn spawn(self) -> (RoomSyncHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (RoomSyncHandle { commands }, task)
    }

    #[cfg(test)]
    async fn settle(&mut self) {
        loop {
            if self.connection.has_changed().unwrap_or(false) {
                self.observe_connection().await;
                continue;
            }
            if let Ok(message) = self.inbound_rx.try_recv() {
                self.handle_inbound(message);
                continue;
            }
            if self.fetches_in_flight > 0 {
                if let Some(done) = self.fetch_rx.recv().await {
                    self.handle_fetch(done);
                }
                continue;
            }
            break;
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// The engine task has stopped.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("sync engine stopped")]
pub struct EngineStopped;

/// Cloneable command sender for a spawned [`RoomSync`].
#[derive(Clone, Debug)]
pub struct RoomSyncHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
}

impl RoomSyncHandle {
    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns [`EngineStopped`] if the engine task has exited.
    pub fn send(&self, command: SyncCommand) -> Result<(), EngineStopped> {
        self.commands.send(command).map_err(|_| EngineStopped)
    }

    /// # Errors
    ///
    /// Returns [`EngineStopped`] if the engine task has exited.
    pub fn open_room(&self, room_uuid: &str) -> Result<(), EngineStopped> {
        self.send(SyncCommand::OpenRoom(room_uuid.to_owned()))
    }

    /// # Errors
    ///
    /// Returns [`EngineStopped`] if the engine task has exited.
    pub fn enter_room(&self, password: &str) -> Result<(), EngineStopped> {
        self.send(SyncCommand::EnterRoom { password: password.to_owned() })
    }

    /// # Errors
    ///
    /// Returns [`EngineStopped`] if the engine task has exited.
    pub fn edit_code(&self, code: &str) -> Result<(), EngineStopped> {
        self.send(SyncCommand::EditCode(code.to_owned()))
    }

    /// # Errors
    ///
    /// Returns [`EngineStopped`] if the engine task has exited.
    pub fn shutdown(&self) -> Result<(), EngineStopped> {
        self.send(SyncCommand::Shutdown)
    }
}
