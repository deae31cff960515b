//! OpenAPI document for the administrative surface.

use axum::Json;
use utoipa::OpenApi;

use crate::handlers::session_logs::SessionLogResponse;
use crate::handlers::sessions::SessionResponse;
use crate::models::session_log::LogoutReason;
use crate::presence::PresenceStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wardboard-presence",
        description = "Session presence tracking: live sessions, termination and the audit trail."
    ),
    paths(
        crate::handlers::sessions::list_sessions,
        crate::handlers::sessions::terminate_session,
        crate::handlers::sessions::sweep_sessions,
        crate::handlers::session_logs::list_session_logs,
    ),
    components(schemas(SessionResponse, SessionLogResponse, PresenceStatus, LogoutReason)),
    tags((name = "presence", description = "Live session presence and audit trail"))
)]
pub struct ApiDoc;

/// GET /api/docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
