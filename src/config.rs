//! Engine configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a `DEFAULT_` constant and is read through [`env_parse`], so
//! a malformed value falls back to the default instead of failing startup.
//! Only the base URL is validated: it decides both the HTTP API root and the
//! derived websocket endpoint.

use std::path::PathBuf;
use std::time::Duration;

use frames::HeartBeat;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
pub const DEFAULT_HEARTBEAT_INCOMING_MS: u64 = 10_000;
pub const DEFAULT_HEARTBEAT_OUTGOING_MS: u64 = 10_000;
pub const DEFAULT_PUBLISH_COALESCE_MS: u64 = 0;
pub const DEFAULT_ORPHAN_COMMENT_CAPACITY: usize = 32;
pub const DEFAULT_ORPHAN_COMMENT_TTL_MS: u64 = 10_000;
pub const DEFAULT_ROOMS_FILE: &str = "./.codeshare/rooms.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Websocket path the room server exposes its STOMP broker on.
const WS_PATH: &str = "/ws";

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL is neither `http://` nor `https://`.
    #[error("invalid base URL (expected http:// or https://): {0}")]
    InvalidBaseUrl(String),
}

/// Runtime settings shared by the transport, HTTP client, and engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// HTTP API root without trailing `/`.
    pub base_url: String,
    /// STOMP websocket endpoint.
    pub ws_url: String,
    /// Delay before reconnecting after a dropped connection.
    pub reconnect_delay: Duration,
    /// Heart-beat offer sent in `CONNECT`.
    pub heart_beat: HeartBeat,
    /// Trailing-edge window for outbound code. `None` publishes every edit.
    pub publish_coalesce: Option<Duration>,
    /// Max comment events held while their snapshot is unknown. `0` disables.
    pub orphan_capacity: usize,
    /// How long a held comment event stays eligible for replay.
    pub orphan_ttl: Duration,
    /// Local room map.
    pub rooms_file: PathBuf,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            ws_url: format!("ws://127.0.0.1:8080{WS_PATH}"),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            heart_beat: HeartBeat::new(DEFAULT_HEARTBEAT_OUTGOING_MS, DEFAULT_HEARTBEAT_INCOMING_MS),
            publish_coalesce: coalesce_window(DEFAULT_PUBLISH_COALESCE_MS),
            orphan_capacity: DEFAULT_ORPHAN_COMMENT_CAPACITY,
            orphan_ttl: Duration::from_millis(DEFAULT_ORPHAN_COMMENT_TTL_MS),
            rooms_file: PathBuf::from(DEFAULT_ROOMS_FILE),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    /// Build config from `CODESHARE_*` environment variables.
    ///
    /// - `CODESHARE_BASE_URL`: HTTP API root (default `http://127.0.0.1:8080`)
    /// - `CODESHARE_WS_URL`: websocket endpoint (default derived from base URL)
    /// - `CODESHARE_RECONNECT_DELAY_MS`: default 5000
    /// - `CODESHARE_HEARTBEAT_INCOMING_MS` / `_OUTGOING_MS`: default 10000
    /// - `CODESHARE_PUBLISH_COALESCE_MS`: default 0 (off)
    /// - `CODESHARE_ORPHAN_COMMENT_CAPACITY`: default 32
    /// - `CODESHARE_ORPHAN_COMMENT_TTL_MS`: default 10000
    /// - `CODESHARE_ROOMS_FILE`: default `./.codeshare/rooms.json`
    /// - `CODESHARE_HTTP_TIMEOUT_SECS`: default 15
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL has an
    /// unsupported scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("CODESHARE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let ws_url = std::env::var("CODESHARE_WS_URL").ok();
        let mut config = Self::default().with_endpoints(&base_url, ws_url.as_deref())?;

        config.reconnect_delay =
            Duration::from_millis(env_parse("CODESHARE_RECONNECT_DELAY_MS", DEFAULT_RECONNECT_DELAY_MS));
        config.heart_beat = HeartBeat::new(
            env_parse("CODESHARE_HEARTBEAT_OUTGOING_MS", DEFAULT_HEARTBEAT_OUTGOING_MS),
            env_parse("CODESHARE_HEARTBEAT_INCOMING_MS", DEFAULT_HEARTBEAT_INCOMING_MS),
        );
        config.publish_coalesce =
            coalesce_window(env_parse("CODESHARE_PUBLISH_COALESCE_MS", DEFAULT_PUBLISH_COALESCE_MS));
        config.orphan_capacity = env_parse("CODESHARE_ORPHAN_COMMENT_CAPACITY", DEFAULT_ORPHAN_COMMENT_CAPACITY);
        config.orphan_ttl =
            Duration::from_millis(env_parse("CODESHARE_ORPHAN_COMMENT_TTL_MS", DEFAULT_ORPHAN_COMMENT_TTL_MS));
        if let Ok(path) = std::env::var("CODESHARE_ROOMS_FILE") {
            config.rooms_file = PathBuf::from(path);
        }
        config.http_timeout = Duration::from_secs(env_parse("CODESHARE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS));

        Ok(config)
    }

    /// Replace the HTTP base URL and websocket endpoint. When `ws_url` is
    /// `None` it is derived from the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` has an
    /// unsupported scheme.
    pub fn with_endpoints(mut self, base_url: &str, ws_url: Option<&str>) -> Result<Self, ConfigError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let derived = derive_ws_url(&base_url)?;
        self.ws_url = ws_url.map_or(derived, ToOwned::to_owned);
        self.base_url = base_url;
        Ok(self)
    }
}

/// `http://host` → `ws://host/ws`, `https://host` → `wss://host/ws`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other scheme.
pub fn derive_ws_url(base_url: &str) -> Result<String, ConfigError> {
    let base_url = base_url.trim_end_matches('/');
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}{WS_PATH}"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}{WS_PATH}"));
    }
    Err(ConfigError::InvalidBaseUrl(base_url.to_owned()))
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn coalesce_window(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
