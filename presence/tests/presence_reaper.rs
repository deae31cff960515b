use std::sync::Arc;
use std::time::Duration;

use wardboard_presence::models::LogoutReason;
use wardboard_presence::services::{reaper::OrphanReaper, termination::TerminationService};
use wardboard_presence::store::PresenceStore;
use wardboard_presence::types::IdentityId;

mod support;

use support::{seed_session, test_store};

const ABANDONED_AFTER: Duration = Duration::from_secs(5 * 60);

fn reaper(store: &Arc<dyn PresenceStore>) -> OrphanReaper {
    let termination = Arc::new(TerminationService::new(Arc::clone(store)));
    OrphanReaper::new(Arc::clone(store), termination, ABANDONED_AFTER)
}

#[tokio::test]
async fn scoped_reap_honors_the_abandoned_threshold() {
    let store = test_store();
    let reaper = reaper(&store);

    let own = seed_session(&store, "1712000000000-00000aaa", "u-2", 5).await;
    seed_session(&store, "1712000000000-00000bbb", "u-2", 6 * 60).await;
    seed_session(&store, "1712000000000-00000ccc", "u-2", 4 * 60).await;

    let identity: IdentityId = "u-2".parse().expect("identity");
    let reclaimed = reaper
        .reap_identity(&identity, Some(&own.session_id))
        .await
        .expect("reap");
    assert_eq!(reclaimed, 1);

    let remaining = store.sessions_for_identity(&identity).await.expect("list");
    let ids: Vec<&str> = remaining.iter().map(|s| s.session_id.as_str()).collect();
    assert!(ids.contains(&"1712000000000-00000aaa"));
    assert!(ids.contains(&"1712000000000-00000ccc"), "4 minutes is idle, not abandoned");
    assert!(!ids.contains(&"1712000000000-00000bbb"));

    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].logout_reason, LogoutReason::ClientClosed);
}

#[tokio::test]
async fn scoped_reap_never_touches_the_callers_own_row() {
    let store = test_store();
    let reaper = reaper(&store);

    // The caller's own row is long stale (a laptop waking from sleep),
    // but it is the one row the scoped pass must leave alone.
    let own = seed_session(&store, "1712000000000-00000abc", "u-3", 10 * 60).await;

    let identity: IdentityId = "u-3".parse().expect("identity");
    let reclaimed = reaper
        .reap_identity(&identity, Some(&own.session_id))
        .await
        .expect("reap");
    assert_eq!(reclaimed, 0);
    assert!(store
        .fetch_session(&own.session_id)
        .await
        .expect("fetch")
        .is_some());
}

#[tokio::test]
async fn full_sweep_counts_only_reclaimed_rows() {
    let store = test_store();
    let reaper = reaper(&store);

    seed_session(&store, "1712000000000-00000001", "u-10", 6 * 60).await;
    seed_session(&store, "1712000000000-00000002", "u-11", 7 * 60).await;
    seed_session(&store, "1712000000000-00000003", "u-12", 8 * 60).await;
    seed_session(&store, "1712000000000-00000004", "u-13", 30).await;
    seed_session(&store, "1712000000000-00000005", "u-14", 2 * 60).await;

    let reclaimed = reaper.sweep().await.expect("sweep");
    assert_eq!(reclaimed, 3);

    let remaining = store.list_sessions().await.expect("list");
    assert_eq!(remaining.len(), 2);
    assert_eq!(store.count_logs().await.expect("count"), 3);
}

#[tokio::test]
async fn sweep_over_an_empty_store_reports_zero() {
    let store = test_store();
    let reaper = reaper(&store);

    let reclaimed = reaper.sweep().await.expect("sweep");
    assert_eq!(reclaimed, 0);
}

#[tokio::test]
async fn concurrent_sweeps_do_not_double_count() {
    let store = test_store();
    seed_session(&store, "1712000000000-00000eee", "u-20", 6 * 60).await;

    let first = reaper(&store);
    let second = reaper(&store);
    let (a, b) = tokio::join!(first.sweep(), second.sweep());
    let total = a.expect("first sweep") + b.expect("second sweep");

    // Exactly one sweep wins the delete; the loser sees the no-op. The
    // audit trail may carry a duplicate entry, which is tolerated.
    assert_eq!(total, 1);
    assert!(store.list_sessions().await.expect("list").is_empty());
    let logs = store.recent_logs(10, 0).await.expect("logs");
    assert!((1..=2).contains(&logs.len()));
}
