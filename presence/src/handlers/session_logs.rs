use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{LogoutReason, PaginatedResponse, PaginationQuery, SessionLog},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionLogResponse {
    pub id: String,
    pub session_id: String,
    pub identity_id: String,
    pub display_label: String,
    pub contact_address: String,
    pub client_descriptor: String,
    pub agent_label: String,
    pub platform_label: String,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub logout_at: DateTime<Utc>,
    pub logout_reason: LogoutReason,
}

impl From<SessionLog> for SessionLogResponse {
    fn from(log: SessionLog) -> Self {
        Self {
            id: log.id,
            session_id: log.session_id.into(),
            identity_id: log.identity_id.into(),
            display_label: log.display_label,
            contact_address: log.contact_address,
            client_descriptor: log.client_descriptor,
            agent_label: log.agent_label,
            platform_label: log.platform_label,
            login_at: log.login_at,
            last_activity_at: log.last_activity_at,
            logout_at: log.logout_at,
            logout_reason: log.logout_reason,
        }
    }
}

/// Termination audit trail for the administrative display, most recent
/// first. Read-only: there is no mutation surface over session logs.
#[utoipa::path(
    get,
    path = "/api/presence/session-logs",
    params(PaginationQuery),
    responses((status = 200, description = "Paginated session log entries")),
    tag = "presence"
)]
pub async fn list_session_logs(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<SessionLogResponse>>, AppError> {
    let limit = query.limit();
    let offset = query.offset();

    let items = state.session_logs.recent(Some(limit), offset).await?;
    let total = state.session_logs.count().await?;

    Ok(Json(PaginatedResponse::new(
        items.into_iter().map(SessionLogResponse::from).collect(),
        total,
        limit,
        offset,
    )))
}
