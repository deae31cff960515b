use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    middleware::request_id::RequestId,
    models::{LogoutReason, Session},
    presence::{classify, PresenceStatus},
    state::AppState,
    types::SessionId,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub identity_id: String,
    pub display_label: String,
    pub contact_address: String,
    pub client_descriptor: String,
    pub agent_label: String,
    pub platform_label: String,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Derived from elapsed time since the last heartbeat at read time.
    pub status: PresenceStatus,
}

impl SessionResponse {
    fn from_session(session: Session, now: DateTime<Utc>, heartbeat_interval: Duration) -> Self {
        let status = classify(session.last_activity_at, now, heartbeat_interval);
        Self {
            session_id: session.session_id.into(),
            identity_id: session.identity_id.into(),
            display_label: session.display_label,
            contact_address: session.contact_address,
            client_descriptor: session.client_descriptor,
            agent_label: session.agent_label,
            platform_label: session.platform_label,
            login_at: session.login_at,
            last_activity_at: session.last_activity_at,
            status,
        }
    }
}

/// Live presence list for the administrative view.
#[utoipa::path(
    get,
    path = "/api/presence/sessions",
    responses((status = 200, description = "Live sessions with derived status", body = [SessionResponse])),
    tag = "presence"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let now = Utc::now();
    let heartbeat_interval = state.config.heartbeat_period();
    let sessions = state.store.list_sessions().await?;
    let responses = sessions
        .into_iter()
        .map(|session| SessionResponse::from_session(session, now, heartbeat_interval))
        .collect();
    Ok(Json(responses))
}

/// Force-closes any session regardless of ownership. Idempotent: a second
/// call on the same id reports `terminated: false` instead of failing.
#[utoipa::path(
    delete,
    path = "/api/presence/sessions/{id}",
    params(("id" = String, Path, description = "Session id to terminate")),
    responses((status = 200, description = "Termination outcome")),
    tag = "presence"
)]
pub async fn terminate_session(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session_id: SessionId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid session ID".into()))?;

    let terminated = state
        .termination
        .terminate(&session_id, LogoutReason::AdminTerminated)
        .await?;

    if terminated {
        tracing::info!(
            request_id = %request_id.0,
            session_id = %session_id,
            "Administrator terminated session"
        );
    }

    let message = if terminated {
        "Session terminated"
    } else {
        "Session already gone"
    };
    Ok(Json(json!({
        "message": message,
        "session_id": session_id,
        "terminated": terminated
    })))
}

/// Administrator-triggered full reaper sweep.
#[utoipa::path(
    post,
    path = "/api/presence/sessions/sweep",
    responses((status = 200, description = "Count of reclaimed sessions")),
    tag = "presence"
)]
pub async fn sweep_sessions(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let reclaimed = state.reaper.sweep().await?;
    Ok(Json(json!({ "reclaimed": reclaimed })))
}
