//! PostgreSQL store backend.
//!
//! Session rows and the audit trail live in the `sessions` and
//! `session_logs` tables (see `migrations/`). Change notification rides on
//! `pg_notify`: every mutation announces itself on one channel, a
//! `PgListener` task forwards payloads into the local broadcast feed, so
//! subscribers in every process observe the same event stream.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::broadcast;

use super::{PresenceStore, StoreError, StoreEvent, EVENT_CAPACITY};
use crate::models::{Session, SessionLog};
use crate::types::{IdentityId, SessionId};

const EVENT_CHANNEL: &str = "presence_events";
const LISTENER_RETRY: Duration = Duration::from_secs(1);

const SESSION_COLUMNS: &str = "session_id, identity_id, contact_address, display_label, \
     client_descriptor, agent_label, platform_label, login_at, last_activity_at";

const LOG_COLUMNS: &str = "id, session_id, identity_id, contact_address, display_label, \
     client_descriptor, agent_label, platform_label, login_at, last_activity_at, \
     logout_at, logout_reason";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Backend(other.into()),
        }
    }
}

pub struct PgPresenceStore {
    pool: PgPool,
    events: broadcast::Sender<StoreEvent>,
}

impl PgPresenceStore {
    /// Wraps `pool` and starts the notification listener task.
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(EVENT_CHANNEL).await?;

        let feed = events.clone();
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<StoreEvent>(notification.payload()) {
                            Ok(event) => {
                                let _ = feed.send(event);
                            }
                            Err(err) => tracing::warn!(
                                error = %err,
                                "Discarding malformed presence notification"
                            ),
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "Presence listener lost its connection; retrying"
                        );
                        tokio::time::sleep(LISTENER_RETRY).await;
                    }
                }
            }
        });

        Ok(Self { pool, events })
    }

    /// Announces a mutation on the shared channel. Notification is advisory:
    /// a failure here is logged and never fails the write it describes.
    async fn notify(&self, event: StoreEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to encode presence notification");
                return;
            }
        };
        if let Err(err) = sqlx::query("SELECT pg_notify($1, $2)")
            .bind(EVENT_CHANNEL)
            .bind(&payload)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %err, "Failed to publish presence notification");
        }
    }
}

#[async_trait]
impl PresenceStore for PgPresenceStore {
    async fn fetch_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn upsert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions
                (session_id, identity_id, contact_address, display_label,
                 client_descriptor, agent_label, platform_label, login_at, last_activity_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (session_id) DO UPDATE
                SET last_activity_at = EXCLUDED.last_activity_at,
                    display_label = EXCLUDED.display_label
            "#,
        )
        .bind(session.session_id.as_str())
        .bind(session.identity_id.as_str())
        .bind(&session.contact_address)
        .bind(&session.display_label)
        .bind(&session.client_descriptor)
        .bind(&session.agent_label)
        .bind(&session.platform_label)
        .bind(session.login_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        self.notify(StoreEvent::SessionUpserted {
            session_id: session.session_id.clone(),
        })
        .await;
        Ok(())
    }

    async fn refresh_session(
        &self,
        id: &SessionId,
        last_activity_at: DateTime<Utc>,
        display_label: Option<String>,
    ) -> Result<bool, StoreError> {
        // Plain UPDATE on purpose: a refresh against a terminated session
        // must miss, not resurrect the row.
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET last_activity_at = $1,
                display_label = COALESCE($2, display_label)
            WHERE session_id = $3
            "#,
        )
        .bind(last_activity_at)
        .bind(display_label)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        let refreshed = result.rows_affected() > 0;
        if refreshed {
            self.notify(StoreEvent::SessionUpserted {
                session_id: id.clone(),
            })
            .await;
        }
        Ok(refreshed)
    }

    async fn remove_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            self.notify(StoreEvent::SessionRemoved {
                session_id: id.clone(),
            })
            .await;
        }
        Ok(removed)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             ORDER BY last_activity_at DESC, session_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn sessions_for_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Vec<Session>, StoreError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE identity_id = $1 \
             ORDER BY last_activity_at DESC, session_id"
        ))
        .bind(identity_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn append_log(&self, log: &SessionLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO session_logs
                (id, session_id, identity_id, contact_address, display_label,
                 client_descriptor, agent_label, platform_label, login_at,
                 last_activity_at, logout_at, logout_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&log.id)
        .bind(log.session_id.as_str())
        .bind(log.identity_id.as_str())
        .bind(&log.contact_address)
        .bind(&log.display_label)
        .bind(&log.client_descriptor)
        .bind(&log.agent_label)
        .bind(&log.platform_label)
        .bind(log.login_at)
        .bind(log.last_activity_at)
        .bind(log.logout_at)
        .bind(log.logout_reason.as_str())
        .execute(&self.pool)
        .await?;

        self.notify(StoreEvent::LogAppended {
            session_id: log.session_id.clone(),
        })
        .await;
        Ok(())
    }

    async fn recent_logs(&self, limit: i64, offset: i64) -> Result<Vec<SessionLog>, StoreError> {
        let logs = sqlx::query_as::<_, SessionLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM session_logs \
             ORDER BY logout_at DESC, id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn count_logs(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM session_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
