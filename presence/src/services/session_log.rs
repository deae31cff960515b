//! Read-only access to the termination audit trail.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::store::{PresenceStore, StoreError, StoreEvent};
use crate::models::SessionLog;

const MAX_PAGE_SIZE: i64 = 500;

pub struct SessionLogReader {
    store: Arc<dyn PresenceStore>,
    default_limit: i64,
}

impl SessionLogReader {
    pub fn new(store: Arc<dyn PresenceStore>, default_limit: i64) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Audit records ordered by `logout_at` descending, bounded by `limit`
    /// (the configured default when `None`).
    pub async fn recent(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<SessionLog>, StoreError> {
        let limit = limit.unwrap_or(self.default_limit).clamp(1, MAX_PAGE_SIZE);
        self.store.recent_logs(limit, offset.max(0)).await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.store.count_logs().await
    }

    /// Change feed for live audit displays; filter for
    /// [`StoreEvent::LogAppended`].
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }
}
