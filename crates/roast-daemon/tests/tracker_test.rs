mod common;

use common::{app, at, FakeStore};
use roast_daemon::events::FocusChange;
use roast_daemon::retry::RetryPolicy;
use roast_daemon::{ExclusionList, SessionTracker};
use std::sync::Arc;

#[tokio::test]
async fn test_event_stream_keeps_one_open_session() {
    let store = Arc::new(FakeStore::default());
    let exclusions = Arc::new(ExclusionList::empty(store.clone()));
    exclusions.add("vault", "Vault").await.unwrap();

    let mut tracker = SessionTracker::new(store.clone(), exclusions)
        .with_retry_policy(RetryPolicy::none());

    let events = vec![
        FocusChange::gained(app("editor"), at(0)),
        FocusChange::gained(app("chat"), at(40)),
        // Arrives late for a session that already closed
        FocusChange::lost("editor", "EDITOR", at(41)),
        FocusChange::lost("chat", "CHAT", at(45)),
        FocusChange::gained(app("vault"), at(50)),
        FocusChange::gained(app("editor"), at(60)),
        // Repeated gain for the open session is a no-op
        FocusChange::gained(app("editor"), at(90)),
    ];

    for change in events {
        tracker.apply(change).await;
        let open = store.sessions().iter().filter(|s| s.is_open()).count();
        assert_eq!(open, 0);
        assert!(tracker.current_session().map_or(true, |s| s.is_open()));
    }

    let outcome = tracker.shutdown(at(100)).await;
    assert_eq!(outcome.requeued, 0);

    let sessions = store.sessions();
    let visits = store.visits();
    assert_eq!(sessions.len(), 3);
    assert_eq!(visits.len(), sessions.len());
    assert!(sessions.iter().all(|s| s.app_id != "vault"));

    for (session, visit) in sessions.iter().zip(&visits) {
        assert_eq!(visit.app_id, session.app_id);
        assert_eq!(visit.timestamp, session.start);
        assert_eq!(visit.duration_secs, session.duration());
    }

    // The excluded app leaves the chain untouched
    assert_eq!(visits[2].previous_app_id.as_deref(), Some("chat"));
    assert_eq!(sessions[2].start, at(60));
    assert_eq!(sessions[2].duration(), 40.0);
}
