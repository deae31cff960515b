//! In-process store backend.
//!
//! Backs the test suite and single-node deployments: every client in the
//! process shares one `Arc<MemoryStore>`, which makes the inter-client
//! concurrency of the subsystem (heartbeats racing terminations, concurrent
//! reapers) directly exercisable without an external store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use super::{PresenceStore, StoreError, StoreEvent, EVENT_CAPACITY};
use crate::models::{Session, SessionLog};
use crate::types::{IdentityId, SessionId};

#[derive(Default)]
struct Collections {
    sessions: HashMap<SessionId, Session>,
    logs: Vec<SessionLog>,
}

pub struct MemoryStore {
    collections: RwLock<Collections>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            collections: RwLock::new(Collections::default()),
            events,
        }
    }

    fn emit(&self, event: StoreEvent) {
        // A send with no subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn fetch_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.sessions.get(id).cloned())
    }

    async fn upsert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        match collections.sessions.get_mut(&session.session_id) {
            Some(existing) => {
                existing.last_activity_at = session.last_activity_at;
                existing.display_label = session.display_label.clone();
            }
            None => {
                collections
                    .sessions
                    .insert(session.session_id.clone(), session.clone());
            }
        }
        drop(collections);
        self.emit(StoreEvent::SessionUpserted {
            session_id: session.session_id.clone(),
        });
        Ok(())
    }

    async fn refresh_session(
        &self,
        id: &SessionId,
        last_activity_at: DateTime<Utc>,
        display_label: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(session) = collections.sessions.get_mut(id) else {
            return Ok(false);
        };
        session.last_activity_at = last_activity_at;
        if let Some(label) = display_label {
            session.display_label = label;
        }
        drop(collections);
        self.emit(StoreEvent::SessionUpserted {
            session_id: id.clone(),
        });
        Ok(true)
    }

    async fn remove_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections.sessions.remove(id).is_some();
        drop(collections);
        if removed {
            self.emit(StoreEvent::SessionRemoved {
                session_id: id.clone(),
            });
        }
        Ok(removed)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let collections = self.collections.read().await;
        let mut sessions: Vec<Session> = collections.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn sessions_for_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Vec<Session>, StoreError> {
        let collections = self.collections.read().await;
        let mut sessions: Vec<Session> = collections
            .sessions
            .values()
            .filter(|s| &s.identity_id == identity_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn append_log(&self, log: &SessionLog) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections.logs.push(log.clone());
        drop(collections);
        self.emit(StoreEvent::LogAppended {
            session_id: log.session_id.clone(),
        });
        Ok(())
    }

    async fn recent_logs(&self, limit: i64, offset: i64) -> Result<Vec<SessionLog>, StoreError> {
        let collections = self.collections.read().await;
        let mut logs: Vec<SessionLog> = collections.logs.clone();
        logs.sort_by(|a, b| b.logout_at.cmp(&a.logout_at));
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(logs.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_logs(&self) -> Result<i64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.logs.len() as i64)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
