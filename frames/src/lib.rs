//! Shared STOMP frame model and text codec for the realtime WS transport.
//!
//! This crate owns the wire representation spoken by the room server's
//! message broker. Frames travel as websocket text messages; a message that
//! contains only end-of-line characters is a heart-beat.
//!
//! ```text
//! COMMAND\n
//! header:value\n
//! ...\n
//! \n
//! body\0
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error returned by [`decode_frame`] and [`HeartBeat::parse`].
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// The command line names no STOMP command.
    #[error("unknown frame command: {0}")]
    UnknownCommand(String),
    /// A header line has no `:` separator.
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    /// A header value contains an escape sequence STOMP does not define.
    #[error("invalid header escape: \\{0}")]
    InvalidEscape(char),
    /// The frame ended before the blank line separating headers from body.
    #[error("frame truncated before body")]
    Truncated,
    /// The `content-length` header is not a number or exceeds the payload.
    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),
    /// The `heart-beat` header is not `<out>,<in>`.
    #[error("invalid heart-beat header: {0}")]
    InvalidHeartBeat(String),
}

/// STOMP 1.2 frame commands, client and server side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    /// Wire spelling of the command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    fn parse(raw: &str) -> Result<Self, CodecError> {
        let command = match raw {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "ACK" => Self::Ack,
            "NACK" => Self::Nack,
            "BEGIN" => Self::Begin,
            "COMMIT" => Self::Commit,
            "ABORT" => Self::Abort,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            other => return Err(CodecError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }

    /// `CONNECT` and `CONNECTED` headers are exempt from value escaping.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame command.
    pub command: Command,
    /// Headers in wire order. Repeated names are allowed; the first wins.
    pub headers: Vec<(String, String)>,
    /// UTF-8 body (JSON for every frame this project exchanges).
    pub body: String,
}

impl Frame {
    /// Empty frame with the given command.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self { command, headers: Vec::new(), body: String::new() }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for header `name`, if present.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `CONNECT` frame announcing STOMP 1.2 and the client heart-beat.
    #[must_use]
    pub fn connect(host: &str, heart_beat: HeartBeat) -> Self {
        Self::new(Command::Connect)
            .header("accept-version", "1.2,1.1,1.0")
            .header("host", host)
            .header("heart-beat", heart_beat.to_string())
    }

    /// `SUBSCRIBE` frame for `destination` under subscription `id`.
    #[must_use]
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    /// `UNSUBSCRIBE` frame for subscription `id`.
    #[must_use]
    pub fn unsubscribe(id: &str) -> Self {
        Self::new(Command::Unsubscribe).header("id", id)
    }

    /// `SEND` frame carrying a JSON body to `destination`.
    #[must_use]
    pub fn send_json(destination: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .with_body(body)
    }

    /// `DISCONNECT` frame.
    #[must_use]
    pub fn disconnect() -> Self {
        Self::new(Command::Disconnect)
    }
}

// =============================================================================
// HEART-BEAT
// =============================================================================

/// The `heart-beat:<out>,<in>` header value, in milliseconds. Zero disables
/// that direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartBeat {
    /// Smallest interval at which the sender can emit heart-beats.
    pub outgoing_ms: u64,
    /// Desired interval at which the sender wants to receive heart-beats.
    pub incoming_ms: u64,
}

impl HeartBeat {
    #[must_use]
    pub fn new(outgoing_ms: u64, incoming_ms: u64) -> Self {
        Self { outgoing_ms, incoming_ms }
    }

    /// Parse a `heart-beat` header value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidHeartBeat`] unless the value is two
    /// comma-separated integers.
    pub fn parse(raw: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidHeartBeat(raw.to_owned());
        let (out, inc) = raw.split_once(',').ok_or_else(invalid)?;
        let outgoing_ms = out.trim().parse().map_err(|_| invalid())?;
        let incoming_ms = inc.trim().parse().map_err(|_| invalid())?;
        Ok(Self { outgoing_ms, incoming_ms })
    }
}

impl fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.outgoing_ms, self.incoming_ms)
    }
}

/// Heart-beat intervals agreed between client and server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NegotiatedHeartBeat {
    /// How often the client must send a heart-beat. `None` = never.
    pub send_every: Option<Duration>,
    /// How often the server promised to send something. `None` = no promise.
    pub expect_every: Option<Duration>,
}

/// Negotiate heart-beats per STOMP 1.2: each direction uses the larger of the
/// two offers, and is disabled if either side offers zero.
#[must_use]
pub fn negotiate_heart_beat(client: HeartBeat, server: HeartBeat) -> NegotiatedHeartBeat {
    let pick = |ours: u64, theirs: u64| {
        (ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
    };
    NegotiatedHeartBeat {
        send_every: pick(client.outgoing_ms, server.incoming_ms),
        expect_every: pick(client.incoming_ms, server.outgoing_ms),
    }
}

/// Wire text of a single heart-beat.
pub const HEART_BEAT: &str = "\n";

// =============================================================================
// CODEC
// =============================================================================

/// Encode a frame into STOMP text, NUL-terminated.
///
/// A `content-length` header is added for non-empty bodies unless the caller
/// supplied one.
#[must_use]
pub fn encode_frame(frame: &Frame) -> String {
    let mut out = String::with_capacity(frame.body.len() + 64);
    out.push_str(frame.command.as_str());
    out.push('\n');

    let escape = frame.command.escapes_headers();
    for (name, value) in &frame.headers {
        if escape {
            out.push_str(&escape_header(name));
            out.push(':');
            out.push_str(&escape_header(value));
        } else {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
        }
        out.push('\n');
    }
    if !frame.body.is_empty() && frame.get_header("content-length").is_none() {
        out.push_str("content-length:");
        out.push_str(&frame.body.len().to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&frame.body);
    out.push('\0');
    out
}

/// Decode one STOMP text message.
///
/// Returns `Ok(None)` for a heart-beat (a message made only of EOLs).
/// Leading EOLs before a frame are skipped.
///
/// # Errors
///
/// Returns a [`CodecError`] describing the first malformed element.
pub fn decode_frame(text: &str) -> Result<Option<Frame>, CodecError> {
    let text = text.trim_start_matches(['\r', '\n']);
    if text.is_empty() {
        return Ok(None);
    }

    let (head, rest) = split_head(text)?;
    let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let command = Command::parse(lines.next().unwrap_or_default())?;
    let unescape = command.escapes_headers();

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| CodecError::MalformedHeader(line.to_owned()))?;
        if unescape {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_owned(), value.to_owned()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| CodecError::InvalidContentLength(v.clone()))
        })
        .transpose()?;

    let body = match content_length {
        Some(len) => rest
            .get(..len)
            .ok_or_else(|| CodecError::InvalidContentLength(len.to_string()))?,
        None => rest.split('\0').next().unwrap_or_default(),
    };

    Ok(Some(Frame { command, headers, body: body.to_owned() }))
}

/// Split at the first blank line, returning (command + headers, body + rest).
fn split_head(text: &str) -> Result<(&str, &str), CodecError> {
    let crlf = text.find("\r\n\r\n").map(|idx| (idx, 4));
    let lf = text.find("\n\n").map(|idx| (idx, 2));
    let separator = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    let (idx, width) = separator.ok_or(CodecError::Truncated)?;
    Ok((&text[..idx], &text[idx + width..]))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, CodecError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some(other) => return Err(CodecError::InvalidEscape(other)),
            None => return Err(CodecError::InvalidEscape(' ')),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
