use std::sync::Arc;
use std::time::Duration;

use wardboard_presence::models::LogoutReason;
use wardboard_presence::services::termination::TerminationService;
use wardboard_presence::store::PresenceStore;
use wardboard_presence::types::SessionId;

mod support;

use support::{kiosk_profile, login_input, seed_session, test_client, test_store};

#[tokio::test]
async fn terminate_writes_the_log_before_the_row_is_gone() {
    let store = test_store();
    let seeded = seed_session(&store, "1712000000000-00000001", "u-1", 10).await;
    let termination = TerminationService::new(Arc::clone(&store));

    let terminated = termination
        .terminate(&seeded.session_id, LogoutReason::AdminTerminated)
        .await
        .expect("terminate");
    assert!(terminated);

    assert!(store
        .fetch_session(&seeded.session_id)
        .await
        .expect("fetch")
        .is_none());

    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.session_id, seeded.session_id);
    assert_eq!(log.logout_reason, LogoutReason::AdminTerminated);
    assert!(log.logout_at >= log.login_at);
    assert_eq!(log.display_label, seeded.display_label);
}

#[tokio::test]
async fn double_terminate_is_a_harmless_no_op() {
    let store = test_store();
    let seeded = seed_session(&store, "1712000000000-00000002", "u-1", 10).await;
    let termination = TerminationService::new(Arc::clone(&store));

    assert!(termination
        .terminate(&seeded.session_id, LogoutReason::ExplicitLogout)
        .await
        .expect("first terminate"));
    assert!(!termination
        .terminate(&seeded.session_id, LogoutReason::ExplicitLogout)
        .await
        .expect("second terminate must not error"));

    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert_eq!(logs.len(), 1, "the absent-row call writes no second log");
}

#[tokio::test]
async fn terminate_on_an_unknown_id_is_a_no_op() {
    let store = test_store();
    let termination = TerminationService::new(Arc::clone(&store));

    let ghost: SessionId = "1712000000000-0000f00d".parse().expect("id");
    let terminated = termination
        .terminate(&ghost, LogoutReason::AdminTerminated)
        .await
        .expect("terminate");
    assert!(!terminated);
    assert_eq!(store.count_logs().await.expect("count"), 0);
}

#[tokio::test]
async fn a_straggling_heartbeat_cannot_resurrect_a_terminated_session() {
    let store = test_store();
    let client = test_client(&store);
    let termination = TerminationService::new(Arc::clone(&store));

    let reg = client
        .registry
        .register(login_input("u-5", "Front Desk"), kiosk_profile())
        .await
        .expect("register");
    let session_id = reg.session_id().clone();

    // Admin wins the race; the client's heartbeat keeps ticking.
    assert!(termination
        .terminate(&session_id, LogoutReason::AdminTerminated)
        .await
        .expect("terminate"));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(
        store
            .fetch_session(&session_id)
            .await
            .expect("fetch")
            .is_none(),
        "heartbeats must never use create-if-absent semantics"
    );
    assert!(store.list_sessions().await.expect("list").is_empty());

    drop(reg);
}

#[tokio::test]
async fn logout_retires_the_session_and_rolls_the_identity() {
    let store = test_store();
    let client = test_client(&store);

    let reg = client
        .registry
        .register(login_input("u-6", "Pharmacy"), kiosk_profile())
        .await
        .expect("register");
    let old_id = reg.session_id().clone();

    reg.logout().await.expect("logout");

    assert!(store
        .fetch_session(&old_id)
        .await
        .expect("fetch")
        .is_none());
    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].logout_reason, LogoutReason::ExplicitLogout);

    let next_id = client.identity.get_or_create().expect("next id");
    assert_ne!(next_id, old_id, "a full logout must not resurrect the old session id");
}

#[tokio::test]
async fn shutdown_is_best_effort_and_keeps_the_identity() {
    let store = test_store();
    let client = test_client(&store);

    let reg = client
        .registry
        .register(login_input("u-8", "Lab Bench"), kiosk_profile())
        .await
        .expect("register");
    let session_id = reg.session_id().clone();

    reg.shutdown().await;

    assert!(store
        .fetch_session(&session_id)
        .await
        .expect("fetch")
        .is_none());
    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].logout_reason, LogoutReason::ClientClosed);

    // The exit hook is not a logout: the same client instance keeps its id.
    let same_id = client.identity.get_or_create().expect("id");
    assert_eq!(same_id, session_id);
}
