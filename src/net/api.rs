//! HTTP client for the room endpoints.
//!
//! Thin reqwest wrapper around the three requests the engine makes. Response
//! bodies are parsed by the pure `parse_*` functions so they can be tested
//! without a server.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::SyncConfig;
use crate::net::types::{ApiEnvelope, NewSnapshot, RoomGrant, SnapshotPayload};
use crate::state::snapshots::Snapshot;

/// Errors from the room HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("{0}")]
    Rejected(String),

    /// The response body is not the expected JSON.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// A success response carried no `data`.
    #[error("response missing data")]
    MissingData,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// The three room endpoints the engine consumes.
#[async_trait::async_trait]
pub trait RoomApi: Send + Sync {
    /// `POST /api/rooms/{uuid}/participants?password=…`
    async fn authorize(&self, room_uuid: &str, password: &str) -> Result<RoomGrant, ApiError>;

    /// `GET /api/rooms/{uuid}/snapshots`, newest first.
    async fn fetch_snapshots(&self, room_uuid: &str) -> Result<Vec<Snapshot>, ApiError>;

    /// `POST /api/rooms/{uuid}/snapshots`
    async fn create_snapshot(&self, room_uuid: &str, snapshot: &NewSnapshot) -> Result<(), ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpRoomApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRoomApi {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn from_config(config: &SyncConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.http_timeout)
    }

    fn rooms_url(&self, room_uuid: &str, tail: &str) -> String {
        format!("{}/api/rooms/{room_uuid}/{tail}", self.base_url)
    }

    async fn read(response: reqwest::Response) -> Result<(u16, String), ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl RoomApi for HttpRoomApi {
    async fn authorize(&self, room_uuid: &str, password: &str) -> Result<RoomGrant, ApiError> {
        let response = self
            .http
            .post(self.rooms_url(room_uuid, "participants"))
            .query(&[("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let (status, text) = Self::read(response).await?;
        parse_grant(status, &text)
    }

    async fn fetch_snapshots(&self, room_uuid: &str) -> Result<Vec<Snapshot>, ApiError> {
        let response = self
            .http
            .get(self.rooms_url(room_uuid, "snapshots"))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let (status, text) = Self::read(response).await?;
        parse_snapshot_list(status, &text)
    }

    async fn create_snapshot(&self, room_uuid: &str, snapshot: &NewSnapshot) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.rooms_url(room_uuid, "snapshots"))
            .json(snapshot)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let (status, text) = Self::read(response).await?;
        parse_ack(status, &text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

const AUTHORIZE_FAILED: &str = "room authorization failed";
const FETCH_FAILED: &str = "failed to load snapshots";
const CREATE_FAILED: &str = "failed to create snapshot";

/// Parse the password exchange response.
///
/// # Errors
///
/// Non-2xx → [`ApiError::Rejected`] with the server's `error` message.
pub fn parse_grant(status: u16, body: &str) -> Result<RoomGrant, ApiError> {
    envelope::<RoomGrant>(status, body, AUTHORIZE_FAILED)?
        .data
        .ok_or(ApiError::MissingData)
}

/// Parse the snapshot list. Entries without an id are skipped; the result
/// is sorted by `createdAt`, newest first.
///
/// # Errors
///
/// Non-2xx → [`ApiError::Rejected`]; bad JSON → [`ApiError::Parse`].
pub fn parse_snapshot_list(status: u16, body: &str) -> Result<Vec<Snapshot>, ApiError> {
    let entries = envelope::<Vec<SnapshotPayload>>(status, body, FETCH_FAILED)?
        .data
        .unwrap_or_default();
    let mut snapshots: Vec<Snapshot> = entries
        .into_iter()
        .filter_map(SnapshotPayload::into_snapshot)
        .collect();
    snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(snapshots)
}

/// Parse a response whose body only matters on failure.
///
/// # Errors
///
/// Non-2xx → [`ApiError::Rejected`].
pub fn parse_ack(status: u16, body: &str) -> Result<(), ApiError> {
    if is_success(status) {
        return Ok(());
    }
    Err(ApiError::Rejected(error_message(body).unwrap_or_else(|| CREATE_FAILED.to_owned())))
}

fn envelope<T: DeserializeOwned>(status: u16, body: &str, fallback: &str) -> Result<ApiEnvelope<T>, ApiError> {
    if !is_success(status) {
        return Err(ApiError::Rejected(error_message(body).unwrap_or_else(|| fallback.to_owned())));
    }
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
