//! Model for live session rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{IdentityId, SessionId};

/// One live client instance's registration record.
///
/// A row exists if and only if the client is considered live: its absence
/// means logged out or reaped. `login_at` is set once at creation and never
/// touched again; `last_activity_at` moves with every heartbeat and
/// registration merge. Online/idle status is derived at read time and never
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Stable for the lifetime of one client instance; survives reloads.
    pub session_id: SessionId,
    /// The authenticated principal. Many sessions may share one identity.
    pub identity_id: IdentityId,
    pub contact_address: String,
    pub display_label: String,
    /// Free-form environment description. Advisory only.
    pub client_descriptor: String,
    pub agent_label: String,
    pub platform_label: String,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}
