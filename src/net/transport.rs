//! Publish/subscribe transport contract.
//!
//! The engine only needs three things from a connection: a connection-state
//! signal, topic subscriptions that deliver message bodies, and fire-and-forget
//! publishing. [`Transport`] is that seam; `StompTransport` implements it over
//! a websocket and tests substitute an in-memory recorder.

use std::fmt;

use tokio::sync::{mpsc, watch};

/// Connection lifecycle as seen by consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Transport-assigned handle for one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A message delivered on a subscribed topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub body: String,
}

/// Where a subscription delivers its messages.
pub type MessageSink = mpsc::UnboundedSender<InboundMessage>;

/// Transport failures. None of these are surfaced to the user.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has no live connection; nothing is queued.
    #[error("transport not connected")]
    NotConnected,

    /// The transport was shut down.
    #[error("transport closed")]
    Closed,

    /// The socket failed while sending or receiving.
    #[error("socket error: {0}")]
    Socket(String),

    /// The broker sent an `ERROR` frame or refused the handshake.
    #[error("broker error: {0}")]
    Broker(String),

    /// The peer sent a frame that does not decode.
    #[error("frame decode failed: {0}")]
    Codec(#[from] frames::CodecError),
}

/// A publish/subscribe connection manager shared by the engine.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Connection-state signal. The current value is readable immediately.
    fn connection(&self) -> watch::Receiver<ConnectionState>;

    /// Subscribe to `topic`; messages are sent to `sink` until unsubscribed
    /// or the connection drops.
    async fn subscribe(&self, topic: &str, sink: MessageSink) -> Result<SubscriptionId, TransportError>;

    /// Cancel a subscription. Unknown ids are not an error.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError>;

    /// Send `body` to `destination`. No acknowledgment is awaited.
    async fn publish(&self, destination: &str, body: String) -> Result<(), TransportError>;

    /// Disconnect and stop reconnecting.
    async fn shutdown(&self);
}
