//! Read-time liveness classification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

/// Derived liveness of a session row. Never persisted: storing it would
/// require a write on every classification and would drift from real
/// elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Idle,
}

/// Classifies a session from the time since its last heartbeat: online while
/// `now - last_activity_at` is at most twice the heartbeat interval, idle
/// after that. A `last_activity_at` in the future (clock skew between
/// writers) counts as online.
pub fn classify(
    last_activity_at: DateTime<Utc>,
    now: DateTime<Utc>,
    heartbeat_interval: Duration,
) -> PresenceStatus {
    let elapsed = now
        .signed_duration_since(last_activity_at)
        .to_std()
        .unwrap_or_default();
    if elapsed <= heartbeat_interval * 2 {
        PresenceStatus::Online
    } else {
        PresenceStatus::Idle
    }
}
