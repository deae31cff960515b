//! Opportunistic reclamation of abandoned session rows.
//!
//! There is no background scheduler: scoped reaps piggyback on fresh logins,
//! and administrators can trigger a full sweep on demand (HTTP or the
//! `presence_sweep` binary).

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{LogoutReason, Session};
use crate::services::termination::TerminationService;
use crate::store::{PresenceStore, StoreError};
use crate::types::{IdentityId, SessionId};

pub struct OrphanReaper {
    store: Arc<dyn PresenceStore>,
    termination: Arc<TerminationService>,
    abandoned_after: Duration,
}

impl OrphanReaper {
    /// `abandoned_after` must be longer than the idle window: idle only
    /// means the user stopped interacting, abandoned means the process is
    /// very likely gone and the row is wasted state.
    pub fn new(
        store: Arc<dyn PresenceStore>,
        termination: Arc<TerminationService>,
        abandoned_after: Duration,
    ) -> Self {
        Self {
            store,
            termination,
            abandoned_after,
        }
    }

    /// Scoped mode: retires stale rows belonging to `identity_id`, skipping
    /// `keep` (the caller's own live session). Returns the reclaimed count.
    pub async fn reap_identity(
        &self,
        identity_id: &IdentityId,
        keep: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        let candidates = self.store.sessions_for_identity(identity_id).await?;
        Ok(self.retire_stale(candidates, keep).await)
    }

    /// Full sweep across all identities. Always completes and reports a
    /// count, zero included: rows that fail to terminate are skipped with a
    /// warning rather than aborting the pass.
    pub async fn sweep(&self) -> Result<u64, StoreError> {
        let candidates = self.store.list_sessions().await?;
        let reclaimed = self.retire_stale(candidates, None).await;
        if reclaimed > 0 {
            tracing::info!(reclaimed, "Sweep reclaimed abandoned sessions");
        }
        Ok(reclaimed)
    }

    async fn retire_stale(&self, candidates: Vec<Session>, keep: Option<&SessionId>) -> u64 {
        let now = Utc::now();
        let mut reclaimed = 0;
        for session in candidates {
            if keep == Some(&session.session_id) {
                continue;
            }
            let elapsed = now
                .signed_duration_since(session.last_activity_at)
                .to_std()
                .unwrap_or_default();
            if elapsed <= self.abandoned_after {
                continue;
            }
            match self
                .termination
                .terminate(&session.session_id, LogoutReason::ClientClosed)
                .await
            {
                Ok(true) => {
                    reclaimed += 1;
                    tracing::info!(
                        session_id = %session.session_id,
                        identity_id = %session.identity_id,
                        "Reaped abandoned session"
                    );
                }
                // A concurrent reaper got there first; its log entry stands.
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        session_id = %session.session_id,
                        error = %err,
                        "Failed to reap session; skipping"
                    );
                }
            }
        }
        reclaimed
    }
}
