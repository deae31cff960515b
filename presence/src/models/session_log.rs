//! Append-only audit records for terminated sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::session::Session;
use crate::types::{IdentityId, SessionId};

/// Why a session was retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The client process went away: either its exit hook fired or the
    /// reaper reclaimed the abandoned row.
    ClientClosed,
    AdminTerminated,
    ExplicitLogout,
    Unknown,
}

impl LogoutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::ClientClosed => "client_closed",
            LogoutReason::AdminTerminated => "admin_terminated",
            LogoutReason::ExplicitLogout => "explicit_logout",
            LogoutReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LogoutReason {
    type Error = std::convert::Infallible;

    /// Unrecognized stored values decode as `Unknown` rather than failing
    /// the read.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.as_str() {
            "client_closed" => LogoutReason::ClientClosed,
            "admin_terminated" => LogoutReason::AdminTerminated,
            "explicit_logout" => LogoutReason::ExplicitLogout,
            _ => LogoutReason::Unknown,
        })
    }
}

/// Immutable record of a terminated session: the full session snapshot at
/// time of death plus when and why it was closed. Never updated or deleted
/// by normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionLog {
    pub id: String,
    pub session_id: SessionId,
    pub identity_id: IdentityId,
    pub contact_address: String,
    pub display_label: String,
    pub client_descriptor: String,
    pub agent_label: String,
    pub platform_label: String,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub logout_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub logout_reason: LogoutReason,
}

impl SessionLog {
    /// Builds the audit record for `session` at the moment of termination.
    pub fn close(session: &Session, logout_at: DateTime<Utc>, reason: LogoutReason) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session.session_id.clone(),
            identity_id: session.identity_id.clone(),
            contact_address: session.contact_address.clone(),
            display_label: session.display_label.clone(),
            client_descriptor: session.client_descriptor.clone(),
            agent_label: session.agent_label.clone(),
            platform_label: session.platform_label.clone(),
            login_at: session.login_at,
            last_activity_at: session.last_activity_at,
            logout_at,
            logout_reason: reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_reason_decodes_as_unknown() {
        let reason = LogoutReason::try_from("kicked_by_moderator".to_string()).expect("infallible");
        assert_eq!(reason, LogoutReason::Unknown);
        assert_eq!(
            LogoutReason::try_from("admin_terminated".to_string()).expect("infallible"),
            LogoutReason::AdminTerminated
        );
    }

    #[test]
    fn close_snapshots_the_session_and_stamps_the_reason() {
        let now = Utc::now();
        let session = Session {
            session_id: "1712000000000-00ffab12".parse().expect("id"),
            identity_id: "u-101".parse().expect("id"),
            contact_address: "nurse@ward.example".to_string(),
            display_label: "Nurse Station 3".to_string(),
            client_descriptor: "kiosk".to_string(),
            agent_label: "firefox".to_string(),
            platform_label: "linux".to_string(),
            login_at: now - chrono::Duration::minutes(10),
            last_activity_at: now - chrono::Duration::seconds(5),
        };
        let log = SessionLog::close(&session, now, LogoutReason::ExplicitLogout);
        assert_eq!(log.session_id, session.session_id);
        assert_eq!(log.logout_reason, LogoutReason::ExplicitLogout);
        assert!(log.logout_at >= log.login_at);
        assert!(!log.id.is_empty());
    }
}
