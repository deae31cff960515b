#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use wardboard_presence::{
    config::Config,
    identity::IdentityStore,
    models::Session,
    services::{
        reaper::OrphanReaper,
        registry::{ClientProfile, RegistrationInput, SessionRegistry},
        termination::TerminationService,
    },
    store::{MemoryStore, PresenceStore},
};

/// Short enough that heartbeat-driven tests finish in a few sleeps.
pub const TEST_HEARTBEAT: Duration = Duration::from_millis(25);
pub const TEST_ABANDONED: Duration = Duration::from_secs(300);

pub fn test_config() -> Config {
    Config {
        store_url: "memory".to_string(),
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        heartbeat_interval_secs: 30,
        abandoned_after_secs: 300,
        session_log_page_size: 100,
        identity_path: "unused".into(),
    }
}

pub fn test_store() -> Arc<dyn PresenceStore> {
    Arc::new(MemoryStore::new())
}

/// One simulated client: its own identity file and registry, sharing the
/// store with every other client in the test.
pub struct TestClient {
    pub registry: SessionRegistry,
    pub identity: Arc<IdentityStore>,
    _identity_dir: TempDir,
}

pub fn test_client(store: &Arc<dyn PresenceStore>) -> TestClient {
    test_client_with(store, TEST_HEARTBEAT, TEST_ABANDONED)
}

pub fn test_client_with(
    store: &Arc<dyn PresenceStore>,
    heartbeat: Duration,
    abandoned: Duration,
) -> TestClient {
    let dir = tempfile::tempdir().expect("identity dir");
    let identity = Arc::new(IdentityStore::new(dir.path().join("session-id")));
    let termination = Arc::new(TerminationService::new(Arc::clone(store)));
    let reaper = Arc::new(OrphanReaper::new(
        Arc::clone(store),
        Arc::clone(&termination),
        abandoned,
    ));
    let registry = SessionRegistry::new(
        Arc::clone(store),
        Arc::clone(&identity),
        termination,
        reaper,
        heartbeat,
    );
    TestClient {
        registry,
        identity,
        _identity_dir: dir,
    }
}

pub fn login_input(identity_id: &str, display_label: &str) -> RegistrationInput {
    RegistrationInput {
        identity_id: identity_id.to_string(),
        contact_address: format!("{identity_id}@ward.example"),
        display_label: display_label.to_string(),
    }
}

pub fn kiosk_profile() -> ClientProfile {
    ClientProfile {
        client_descriptor: "ward kiosk".to_string(),
        agent_label: "firefox".to_string(),
        platform_label: "linux".to_string(),
    }
}

/// Writes a session row directly into the store, last active
/// `last_active_secs_ago` seconds in the past.
pub async fn seed_session(
    store: &Arc<dyn PresenceStore>,
    session_id: &str,
    identity_id: &str,
    last_active_secs_ago: i64,
) -> Session {
    let last_activity_at = Utc::now() - ChronoDuration::seconds(last_active_secs_ago);
    let session = Session {
        session_id: session_id.parse().expect("session id"),
        identity_id: identity_id.parse().expect("identity id"),
        contact_address: format!("{identity_id}@ward.example"),
        display_label: format!("Station {session_id}"),
        client_descriptor: "ward kiosk".to_string(),
        agent_label: "firefox".to_string(),
        platform_label: "linux".to_string(),
        login_at: last_activity_at - ChronoDuration::minutes(30),
        last_activity_at,
    };
    store.upsert_session(&session).await.expect("seed session");
    session
}
