//! JSON API handlers for the Parley server.

use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_session::{SessionError, SessionSnapshot};
use parley_types::{Control, DeviceControls, Message};
use parley_voice::{rtvi, VoiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on how long a connect or disconnect request waits for the
/// voice agent before the HTTP call gives up. The session keeps going.
pub const CONNECTION_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Session state plus the transcript header line.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    pub summary: String,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        let summary = snapshot.summary();
        Self { snapshot, summary }
    }
}

/// Request body for `POST /api/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Request body for `PUT /api/controls/{control}`.
#[derive(Debug, Deserialize)]
pub struct SetControlRequest {
    pub enabled: bool,
}

/// Response body for `POST /api/events`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Whether the payload decoded to a session event.
    pub accepted: bool,
    /// The decoded event type, when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("voice agent error: {0}")]
    BadGateway(String),
    #[error("timed out: {0}")]
    GatewayTimeout(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::NotConnected => ApiError::Conflict(err.to_string()),
            SessionError::EmptyMessage => ApiError::BadRequest(err.to_string()),
            SessionError::Closed => ApiError::InternalServerError(err.to_string()),
            SessionError::Voice(voice) => match voice {
                VoiceError::TransportConnect(_) => ApiError::BadGateway(voice.to_string()),
                VoiceError::Config(_) => ApiError::BadRequest(voice.to_string()),
                VoiceError::NotConnected | VoiceError::DeviceAccess { .. } => {
                    ApiError::Conflict(voice.to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

async fn with_timeout(
    action: &'static str,
    request: impl Future<Output = Result<(), SessionError>>,
) -> Result<(), ApiError> {
    match tokio::time::timeout(CONNECTION_REQUEST_TIMEOUT, request).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => {
            tracing::warn!(action, "voice agent did not respond in time");
            Err(ApiError::GatewayTimeout(format!("{action} did not complete")))
        }
    }
}

async fn session_response(state: &AppState) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.session.snapshot().await?;
    Ok(Json(snapshot.into()))
}

/// Handler for `GET /api/session`.
pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    session_response(&state).await
}

/// Handler for `POST /api/session/connect`.
///
/// Waits for the agent to report the session live. A refused connection
/// returns 502 and leaves the failure notice in the session state.
pub async fn connect_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    with_timeout("connect", state.session.connect()).await?;
    session_response(&state).await
}

/// Handler for `POST /api/session/disconnect`.
pub async fn disconnect_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    with_timeout("disconnect", state.session.disconnect()).await?;
    session_response(&state).await
}

/// Handler for `POST /api/session/toggle`.
pub async fn toggle_connection_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    with_timeout("toggle", state.session.toggle_connection()).await?;
    session_response(&state).await
}

/// Handler for `GET /api/messages`.
pub async fn list_messages_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.session.messages().await?))
}

/// Handler for `POST /api/messages`.
///
/// The message is in the transcript when this returns; the agent's reply
/// arrives later on the update stream.
pub async fn send_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state.session.send_user_text(payload.text).await?;
    tracing::debug!(id = %message.id, "user message accepted");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Handler for `PUT /api/controls/{control}`.
///
/// Returns the toggles as they stand after the request. Device failures
/// revert a toggle asynchronously and show up on the update stream.
pub async fn set_control_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(control): Path<String>,
    Json(payload): Json<SetControlRequest>,
) -> Result<Json<DeviceControls>, ApiError> {
    let control: Control = control
        .parse()
        .map_err(|e: parley_types::ParseControlError| ApiError::NotFound(e.to_string()))?;

    state.session.set_control(control, payload.enabled).await?;
    let snapshot = state.session.snapshot().await?;
    Ok(Json(snapshot.controls))
}

/// Handler for `POST /api/events`.
///
/// Accepts one RTVI message from an external agent bridge and feeds it
/// through the session queue. Unrecognized messages are acknowledged with
/// `accepted: false` so bridges can forward everything they receive.
pub async fn ingest_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let Some(event) = rtvi::decode_value(payload) else {
        return Ok((
            StatusCode::ACCEPTED,
            Json(IngestResponse {
                accepted: false,
                event: None,
            }),
        ));
    };

    let event_type = event.event_type().to_string();
    state.session.ingest(event).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            accepted: true,
            event: Some(event_type),
        }),
    ))
}
