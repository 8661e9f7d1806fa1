//! STOMP-over-websocket implementation of [`Transport`].
//!
//! DESIGN
//! ======
//! One spawned task owns the socket. Callers talk to it over an unbounded
//! request channel; subscribe and publish carry a oneshot for the result.
//! The task cycles through three phases:
//!
//! 1. Connecting: open the websocket, send `CONNECT`, wait for `CONNECTED`
//!    and negotiate heart-beats.
//! 2. Connected: multiplex caller requests, inbound frames, outgoing
//!    heart-beats, and the inbound-silence watchdog.
//! 3. Waiting: after any drop, sleep for the reconnect delay and go back to 1.
//!
//! Outside phase 2 every subscribe/publish is answered with
//! [`TransportError::NotConnected`]; nothing is queued. A drop discards all
//! subscriptions, so consumers re-subscribe when they see `Connected` again.
//!
//! ERROR HANDLING
//! ==============
//! Socket errors, `ERROR` frames and heart-beat timeouts end the session and
//! are logged. Frames that fail to decode are logged and skipped.

#[cfg(test)]
#[path = "stomp_client_test.rs"]
mod stomp_client_test;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use frames::{Command, Frame, HEART_BEAT, HeartBeat, NegotiatedHeartBeat, decode_frame, encode_frame, negotiate_heart_beat};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::net::transport::{ConnectionState, InboundMessage, MessageSink, SubscriptionId, Transport, TransportError};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Connection settings for [`StompTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompConfig {
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub heart_beat: HeartBeat,
    /// Upper bound on websocket open plus the `CONNECTED` handshake.
    pub connect_timeout: Duration,
}

impl StompConfig {
    #[must_use]
    pub fn from_sync(config: &SyncConfig) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay,
            heart_beat: config.heart_beat,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

enum Request {
    Subscribe {
        id: SubscriptionId,
        topic: String,
        sink: MessageSink,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    Unsubscribe {
        id: SubscriptionId,
    },
    Publish {
        destination: String,
        body: String,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Handle to the background connection task. Dropping it stops the task.
pub struct StompTransport {
    requests: mpsc::UnboundedSender<Request>,
    state: watch::Receiver<ConnectionState>,
    next_id: AtomicU64,
}

impl StompTransport {
    /// Spawn the connection task and return immediately. The first connect
    /// attempt starts right away.
    #[must_use]
    pub fn start(config: StompConfig) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
        info!(ws_url = %config.ws_url, "stomp transport starting");
        tokio::spawn(connection_loop(config, rx, state_tx));
        Self { requests, state, next_id: AtomicU64::new(1) }
    }

    async fn roundtrip(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), TransportError>>) -> Request,
    ) -> Result<(), TransportError> {
        let (reply, result) = oneshot::channel();
        self.requests
            .send(build(reply))
            .map_err(|_| TransportError::Closed)?;
        result.await.map_err(|_| TransportError::Closed)?
    }
}

#[async_trait::async_trait]
impl Transport for StompTransport {
    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    async fn subscribe(&self, topic: &str, sink: MessageSink) -> Result<SubscriptionId, TransportError> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let topic = topic.to_owned();
        self.roundtrip(|reply| Request::Subscribe { id, topic, sink, reply })
            .await?;
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError> {
        self.requests
            .send(Request::Unsubscribe { id })
            .map_err(|_| TransportError::Closed)
    }

    async fn publish(&self, destination: &str, body: String) -> Result<(), TransportError> {
        let destination = destination.to_owned();
        self.roundtrip(|reply| Request::Publish { destination, body, reply })
            .await
    }

    async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.requests.send(Request::Shutdown { done }).is_ok() {
            let _ = finished.await;
        }
    }
}

// =============================================================================
// CONNECTION TASK
// =============================================================================

enum SessionEnd {
    Shutdown,
    Dropped(TransportError),
}

async fn connection_loop(
    config: StompConfig,
    mut requests: mpsc::UnboundedReceiver<Request>,
    state: watch::Sender<ConnectionState>,
) {
    loop {
        state.send_replace(ConnectionState::Connecting);
        let Some(attempt) = reject_while(connect(&config), &mut requests).await else {
            state.send_replace(ConnectionState::Disconnected);
            info!("stomp transport stopped");
            return;
        };

        match attempt {
            Ok((ws, negotiated)) => {
                info!(
                    ws_url = %config.ws_url,
                    send_every = ?negotiated.send_every,
                    expect_every = ?negotiated.expect_every,
                    "stomp connected"
                );
                state.send_replace(ConnectionState::Connected);
                let end = run_session(ws, negotiated, &mut requests).await;
                state.send_replace(ConnectionState::Disconnected);
                match end {
                    SessionEnd::Shutdown => {
                        info!("stomp transport stopped");
                        return;
                    }
                    SessionEnd::Dropped(error) => warn!(%error, "stomp connection dropped"),
                }
            }
            Err(error) => {
                state.send_replace(ConnectionState::Disconnected);
                warn!(ws_url = %config.ws_url, %error, "stomp connect failed");
            }
        }

        debug!(delay = ?config.reconnect_delay, "waiting to reconnect");
        if reject_while(tokio::time::sleep(config.reconnect_delay), &mut requests)
            .await
            .is_none()
        {
            info!("stomp transport stopped");
            return;
        }
    }
}

/// Drive `work` to completion while answering every request with
/// `NotConnected`. Returns `None` if a shutdown arrives or all handles are
/// dropped first.
async fn reject_while<F: Future>(work: F, requests: &mut mpsc::UnboundedReceiver<Request>) -> Option<F::Output> {
    tokio::pin!(work);
    loop {
        tokio::select! {
            output = &mut work => return Some(output),
            request = requests.recv() => match request {
                None => return None,
                Some(Request::Shutdown { done }) => {
                    let _ = done.send(());
                    return None;
                }
                Some(Request::Subscribe { reply, .. } | Request::Publish { reply, .. }) => {
                    let _ = reply.send(Err(TransportError::NotConnected));
                }
                Some(Request::Unsubscribe { .. }) => {}
            },
        }
    }
}

async fn connect(config: &StompConfig) -> Result<(WsStream, NegotiatedHeartBeat), TransportError> {
    let handshake = async {
        let (mut ws, _) = connect_async(config.ws_url.as_str())
            .await
            .map_err(socket_error)?;
        let hello = Frame::connect(host_of(&config.ws_url), config.heart_beat);
        ws.send(Message::text(encode_frame(&hello)))
            .await
            .map_err(socket_error)?;

        loop {
            let message = ws
                .next()
                .await
                .ok_or(TransportError::Closed)?
                .map_err(socket_error)?;
            let Message::Text(text) = message else {
                continue;
            };
            let Some(frame) = decode_frame(text.as_str())? else {
                continue;
            };
            match frame.command {
                Command::Connected => {
                    let server = frame
                        .get_header("heart-beat")
                        .map(HeartBeat::parse)
                        .transpose()?
                        .unwrap_or_default();
                    return Ok((ws, negotiate_heart_beat(config.heart_beat, server)));
                }
                Command::Error => return Err(TransportError::Broker(broker_message(&frame))),
                other => debug!(command = %other, "ignoring frame before CONNECTED"),
            }
        }
    };

    tokio::time::timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| TransportError::Socket("connect timed out".to_owned()))?
}

async fn run_session(
    ws: WsStream,
    negotiated: NegotiatedHeartBeat,
    requests: &mut mpsc::UnboundedReceiver<Request>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();
    let mut subscriptions: BTreeMap<String, (String, MessageSink)> = BTreeMap::new();
    let mut send_tick = negotiated.send_every.map(|every| {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    // stomp.js tolerance: allow twice the promised interval.
    let grace = negotiated.expect_every.map(|every| every * 2);
    let mut last_seen = Instant::now();

    loop {
        let deadline = grace.map(|grace| last_seen + grace);
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else {
                    let _ = send_frame(&mut sink, &Frame::disconnect()).await;
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                };
                if let Some(end) = handle_request(&mut sink, &mut subscriptions, request).await {
                    return end;
                }
            }
            message = stream.next() => {
                last_seen = Instant::now();
                let message = match message {
                    None => return SessionEnd::Dropped(TransportError::Closed),
                    Some(Err(error)) => return SessionEnd::Dropped(socket_error(error)),
                    Some(Ok(message)) => message,
                };
                match message {
                    Message::Text(text) => match decode_frame(text.as_str()) {
                        Ok(None) => {}
                        Ok(Some(frame)) => {
                            if let Err(error) = route_frame(frame, &subscriptions) {
                                return SessionEnd::Dropped(error);
                            }
                        }
                        Err(error) => warn!(%error, "skipping undecodable frame"),
                    },
                    Message::Close(_) => return SessionEnd::Dropped(TransportError::Closed),
                    _ => {}
                }
            }
            () = maybe_tick(&mut send_tick) => {
                if let Err(error) = sink.send(Message::text(HEART_BEAT.to_owned())).await {
                    return SessionEnd::Dropped(socket_error(error));
                }
            }
            () = sleep_until_opt(deadline) => {
                return SessionEnd::Dropped(TransportError::Socket("heart-beat timeout".to_owned()));
            }
        }
    }
}

/// Apply one caller request to the live session. `Some` ends the session.
async fn handle_request(
    sink: &mut WsSink,
    subscriptions: &mut BTreeMap<String, (String, MessageSink)>,
    request: Request,
) -> Option<SessionEnd> {
    match request {
        Request::Subscribe { id, topic, sink: messages, reply } => {
            let wire_id = id.to_string();
            match send_frame(sink, &Frame::subscribe(&wire_id, &topic)).await {
                Ok(()) => {
                    subscriptions.insert(wire_id, (topic, messages));
                    let _ = reply.send(Ok(()));
                    None
                }
                Err(error) => {
                    let _ = reply.send(Err(error.clone()));
                    Some(SessionEnd::Dropped(error))
                }
            }
        }
        Request::Unsubscribe { id } => {
            let wire_id = id.to_string();
            if subscriptions.remove(&wire_id).is_none() {
                return None;
            }
            send_frame(sink, &Frame::unsubscribe(&wire_id))
                .await
                .err()
                .map(SessionEnd::Dropped)
        }
        Request::Publish { destination, body, reply } => {
            match send_frame(sink, &Frame::send_json(&destination, body)).await {
                Ok(()) => {
                    let _ = reply.send(Ok(()));
                    None
                }
                Err(error) => {
                    let _ = reply.send(Err(error.clone()));
                    Some(SessionEnd::Dropped(error))
                }
            }
        }
        Request::Shutdown { done } => {
            let _ = send_frame(sink, &Frame::disconnect()).await;
            let _ = sink.close().await;
            let _ = done.send(());
            Some(SessionEnd::Shutdown)
        }
    }
}

fn route_frame(frame: Frame, subscriptions: &BTreeMap<String, (String, MessageSink)>) -> Result<(), TransportError> {
    match frame.command {
        Command::Message => {
            let Some(wire_id) = frame.get_header("subscription") else {
                warn!("MESSAGE frame without subscription header");
                return Ok(());
            };
            let Some((topic, messages)) = subscriptions.get(wire_id) else {
                debug!(subscription = wire_id, "MESSAGE for unknown subscription");
                return Ok(());
            };
            let delivered = messages.send(InboundMessage { topic: topic.clone(), body: frame.body });
            if delivered.is_err() {
                debug!(%topic, "subscriber gone; message dropped");
            }
            Ok(())
        }
        Command::Error => Err(TransportError::Broker(broker_message(&frame))),
        Command::Receipt => Ok(()),
        other => {
            debug!(command = %other, "ignoring unexpected frame");
            Ok(())
        }
    }
}

async fn send_frame(sink: &mut WsSink, frame: &Frame) -> Result<(), TransportError> {
    sink.send(Message::text(encode_frame(frame)))
        .await
        .map_err(socket_error)
}

async fn maybe_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

fn socket_error(error: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::Socket(error.to_string())
}

fn broker_message(frame: &Frame) -> String {
    frame
        .get_header("message")
        .map_or_else(|| frame.body.clone(), ToOwned::to_owned)
}

/// Host part of a websocket URL, for the `CONNECT` `host` header.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or(rest)
}
