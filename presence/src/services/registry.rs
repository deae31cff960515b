//! Login-time session registration and the client-side lifecycle handle.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use validator::Validate;

use crate::config::Config;
use crate::identity::IdentityStore;
use crate::models::{LogoutReason, Session};
use crate::services::heartbeat;
use crate::services::reaper::OrphanReaper;
use crate::services::termination::TerminationService;
use crate::store::PresenceStore;
use crate::types::{IdentityId, SessionId};

/// The authenticated-identity event that triggers a registration.
#[derive(Debug, Clone, Validate)]
pub struct RegistrationInput {
    #[validate(length(min = 1, max = 128))]
    pub identity_id: String,
    #[validate(email)]
    pub contact_address: String,
    #[validate(length(max = 256))]
    pub display_label: String,
}

/// Free-form environment description (device/browser/OS). Advisory only.
#[derive(Debug, Clone, Default)]
pub struct ClientProfile {
    pub client_descriptor: String,
    pub agent_label: String,
    pub platform_label: String,
}

/// Registers clients into the shared store and hands back the handle that
/// owns their heartbeat.
pub struct SessionRegistry {
    store: Arc<dyn PresenceStore>,
    identity: Arc<IdentityStore>,
    termination: Arc<TerminationService>,
    reaper: Arc<OrphanReaper>,
    heartbeat_period: Duration,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        identity: Arc<IdentityStore>,
        termination: Arc<TerminationService>,
        reaper: Arc<OrphanReaper>,
        heartbeat_period: Duration,
    ) -> Self {
        Self {
            store,
            identity,
            termination,
            reaper,
            heartbeat_period,
        }
    }

    /// Wires a registry for a client host from its configuration: identity
    /// file, termination service and scoped reaper all hang off the one
    /// shared store handle.
    pub fn from_config(store: Arc<dyn PresenceStore>, config: &Config) -> Self {
        let identity = Arc::new(IdentityStore::new(config.identity_path.clone()));
        let termination = Arc::new(TerminationService::new(Arc::clone(&store)));
        let reaper = Arc::new(OrphanReaper::new(
            Arc::clone(&store),
            Arc::clone(&termination),
            config.abandoned_after(),
        ));
        Self::new(
            store,
            identity,
            termination,
            reaper,
            config.heartbeat_period(),
        )
    }

    /// Registers this client as logged in.
    ///
    /// A first registration inserts a fresh row with `login_at =
    /// last_activity_at = now`. Registering again under the same persisted
    /// session id (a reload of the same client instance, not a new login)
    /// merges instead: `last_activity_at` and `display_label` are refreshed
    /// and `login_at` is left alone, so a reload never resets session age.
    ///
    /// Registration also retires abandoned rows left behind by the same
    /// principal (crashed tabs, dead devices); a reap failure is logged and
    /// never blocks the login itself.
    pub async fn register(
        &self,
        input: RegistrationInput,
        profile: ClientProfile,
    ) -> anyhow::Result<Registration> {
        input.validate()?;

        let session_id = self.identity.get_or_create()?;
        let identity_id: IdentityId = input.identity_id.parse()?;
        let now = Utc::now();

        match self.store.fetch_session(&session_id).await? {
            Some(_) => {
                self.store
                    .refresh_session(&session_id, now, Some(input.display_label.clone()))
                    .await?;
                tracing::debug!(session_id = %session_id, "Reload merged into existing session");
            }
            None => {
                let session = Session {
                    session_id: session_id.clone(),
                    identity_id: identity_id.clone(),
                    contact_address: input.contact_address,
                    display_label: input.display_label,
                    client_descriptor: profile.client_descriptor,
                    agent_label: profile.agent_label,
                    platform_label: profile.platform_label,
                    login_at: now,
                    last_activity_at: now,
                };
                self.store.upsert_session(&session).await?;
            }
        }

        if let Err(err) = self
            .reaper
            .reap_identity(&identity_id, Some(&session_id))
            .await
        {
            tracing::warn!(
                identity_id = %identity_id,
                error = %err,
                "Scoped reap after registration failed"
            );
        }

        let heartbeat = heartbeat::spawn(
            Arc::clone(&self.store),
            session_id.clone(),
            self.heartbeat_period,
        );

        tracing::info!(
            session_id = %session_id,
            identity_id = %identity_id,
            "Session registered"
        );
        Ok(Registration {
            session_id,
            heartbeat: Some(heartbeat),
            termination: Arc::clone(&self.termination),
            identity: Arc::clone(&self.identity),
        })
    }
}

/// Handle returned by [`SessionRegistry::register`]. Owns the heartbeat
/// task: dropping or cancelling the handle stops it. An uncancelled
/// heartbeat would keep resurrecting `last_activity_at` on a session the
/// caller believes is gone.
pub struct Registration {
    session_id: SessionId,
    heartbeat: Option<JoinHandle<()>>,
    termination: Arc<TerminationService>,
    identity: Arc<IdentityStore>,
}

impl Registration {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stops the heartbeat without touching the session row. Call on
    /// component teardown when the session itself should stay live.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.heartbeat.take() {
            handle.abort();
        }
    }

    /// Deliberate sign-out: terminate with `explicit_logout`, then clear the
    /// stored identity so the next login starts a fresh session id instead
    /// of resurrecting this one.
    pub async fn logout(mut self) -> anyhow::Result<()> {
        self.cancel();
        self.termination
            .terminate(&self.session_id, LogoutReason::ExplicitLogout)
            .await?;
        self.identity.clear()?;
        Ok(())
    }

    /// Host-lifecycle exit hook. Best effort: failures are swallowed, and
    /// nothing guarantees the paired log write lands if the process dies
    /// mid-call. The orphan reaper eventually produces the `client_closed`
    /// entry for any row missed here, so the audit trail self-heals within
    /// the abandoned-threshold window.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Err(err) = self
            .termination
            .terminate(&self.session_id, LogoutReason::ClientClosed)
            .await
        {
            tracing::warn!(
                session_id = %self.session_id,
                error = %err,
                "Best-effort shutdown terminate failed"
            );
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(handle) = self.heartbeat.take() {
            handle.abort();
        }
    }
}
