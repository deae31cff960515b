//! Periodic liveness refresh for an owned session row.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::PresenceStore;
use crate::types::SessionId;

/// Spawns the heartbeat task for `session_id`. Each tick is a best-effort
/// update of `last_activity_at`; the task only stops when its handle is
/// aborted by [`Registration::cancel`](crate::services::registry::Registration::cancel).
pub(crate) fn spawn(
    store: Arc<dyn PresenceStore>,
    session_id: SessionId,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; registration has already
        // written the row, so skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.refresh_session(&session_id, Utc::now(), None).await {
                Ok(true) => {
                    tracing::trace!(session_id = %session_id, "Heartbeat refreshed");
                }
                // The row was terminated or reaped in the interim. Expected,
                // and never recreated: termination is permanent until the
                // next explicit login.
                Ok(false) => {
                    tracing::debug!(session_id = %session_id, "Heartbeat miss; session row is gone");
                }
                Err(err) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %err,
                        "Heartbeat write failed; retrying on the next tick"
                    );
                }
            }
        }
    })
}
