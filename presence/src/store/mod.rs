//! Storage seam for the presence subsystem.
//!
//! The shared document store is opaque to the rest of the crate: read,
//! merge-write, delete, query by field and subscribe are the only
//! primitives anything here relies on. Per-row last-write-wins is the only
//! ordering guarantee assumed. [`memory`] backs the test suite and
//! single-node deployments; [`postgres`] is the production backend.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgPresenceStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{Session, SessionLog};
use crate::types::{IdentityId, SessionId};

/// Buffered change events per subscriber before lagging ones start dropping.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transient backend trouble (network, timeout). Heartbeat and reap
    /// paths swallow this and retry on their next pass.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Change notification emitted by a store after a mutation becomes visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    SessionUpserted { session_id: SessionId },
    SessionRemoved { session_id: SessionId },
    LogAppended { session_id: SessionId },
}

/// The shared mutable session/session-log collections, behind whatever
/// store product actually holds them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn fetch_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Inserts `session`, or merges into an existing row with the same id.
    /// A merge refreshes `last_activity_at` and `display_label` only;
    /// `login_at` is immutable after creation.
    async fn upsert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Update-only activity refresh. Returns `false` when no row exists.
    /// It must NEVER create one, or a terminated session could be
    /// resurrected by a straggling heartbeat.
    async fn refresh_session(
        &self,
        id: &SessionId,
        last_activity_at: DateTime<Utc>,
        display_label: Option<String>,
    ) -> Result<bool, StoreError>;

    /// Deletes the row; `false` when it was already gone.
    async fn remove_session(&self, id: &SessionId) -> Result<bool, StoreError>;

    /// All live sessions, most recently active first.
    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    async fn sessions_for_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Vec<Session>, StoreError>;

    /// Appends to the audit trail. Append-only: logs are never updated or
    /// deleted through this seam.
    async fn append_log(&self, log: &SessionLog) -> Result<(), StoreError>;

    /// Audit records ordered by `logout_at` descending.
    async fn recent_logs(&self, limit: i64, offset: i64) -> Result<Vec<SessionLog>, StoreError>;

    async fn count_logs(&self) -> Result<i64, StoreError>;

    /// Live change feed over both collections.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
