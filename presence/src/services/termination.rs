//! Retires live sessions: audit log first, then delete.

use chrono::Utc;
use std::sync::Arc;

use crate::models::{LogoutReason, SessionLog};
use crate::store::{PresenceStore, StoreError};
use crate::types::SessionId;

pub struct TerminationService {
    store: Arc<dyn PresenceStore>,
}

impl TerminationService {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    /// Terminates `id`: snapshot the row, append the [`SessionLog`] entry,
    /// then delete. The log write is sequenced before the delete from this
    /// single caller, so the audit record exists before the row's absence
    /// becomes visible. An absent row is an idempotent no-op (`false`).
    ///
    /// Two racing callers may both read the row and each write a log entry;
    /// only the caller whose delete actually lands gets `true`, so reaper
    /// counts stay honest. The audit trail keeps the duplicate: log rows
    /// are append-only records, not a liveness source of truth.
    pub async fn terminate(
        &self,
        id: &SessionId,
        reason: LogoutReason,
    ) -> Result<bool, StoreError> {
        let Some(session) = self.store.fetch_session(id).await? else {
            tracing::debug!(session_id = %id, "Terminate on absent session; nothing to do");
            return Ok(false);
        };

        let log = SessionLog::close(&session, Utc::now(), reason);
        self.store.append_log(&log).await?;
        let removed = self.store.remove_session(id).await?;

        if removed {
            tracing::info!(
                session_id = %id,
                identity_id = %session.identity_id,
                reason = %reason,
                "Session terminated"
            );
        }
        Ok(removed)
    }
}
