//! The focus-change state machine.
//!
//! At most one session is open at a time. Every transition away from an open
//! session closes it, persists it, and queues the derived visit. A session
//! whose save fails is kept and saved again on the next flush. The tracker
//! is driven from a single task, so transitions never interleave.

use chrono::{DateTime, Utc};
use roast_common::{FocusedApp, Session, Visit};
use roast_db::ActivityStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::buffer::{FlushOutcome, PendingVisitBuffer};
use crate::events::FocusChange;
use crate::exclusions::ExclusionList;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    Idle,
    Tracking(Session),
}

/// Snapshot of the open session for display. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSession {
    pub session_id: Uuid,
    pub app_id: String,
    pub app_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl LiveSession {
    /// The open session this snapshot was taken from.
    pub fn to_open_session(&self) -> Session {
        Session {
            id: self.session_id,
            app_id: self.app_id.clone(),
            app_name: self.app_name.clone(),
            window_title: None,
            start: self.started_at,
            end: None,
            is_active: true,
            created_at: self.started_at,
        }
    }
}

pub struct SessionTracker {
    state: TrackerState,
    previous_app: Option<String>,
    buffer: PendingVisitBuffer,
    unsaved_sessions: Vec<Session>,
    store: Arc<dyn ActivityStore>,
    exclusions: Arc<ExclusionList>,
    retry: RetryPolicy,
    capture_window_titles: bool,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn ActivityStore>, exclusions: Arc<ExclusionList>) -> Self {
        Self {
            state: TrackerState::Idle,
            previous_app: None,
            buffer: PendingVisitBuffer::new(),
            unsaved_sessions: Vec::new(),
            store,
            exclusions,
            retry: RetryPolicy::default(),
            capture_window_titles: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_window_titles(mut self, capture: bool) -> Self {
        self.capture_window_titles = capture;
        self
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn current_session(&self) -> Option<&Session> {
        match &self.state {
            TrackerState::Tracking(session) => Some(session),
            TrackerState::Idle => None,
        }
    }

    pub fn previous_app(&self) -> Option<&str> {
        self.previous_app.as_deref()
    }

    pub fn pending_visits(&self) -> usize {
        self.buffer.len()
    }

    /// Closed sessions still waiting for a successful save.
    pub fn pending_sessions(&self) -> usize {
        self.unsaved_sessions.len()
    }

    pub fn live_session(&self, now: DateTime<Utc>) -> Option<LiveSession> {
        self.current_session().map(|session| LiveSession {
            session_id: session.id,
            app_id: session.app_id.clone(),
            app_name: session.app_name.clone(),
            started_at: session.start,
            duration_secs: session.duration_at(now),
        })
    }

    pub async fn apply(&mut self, change: FocusChange) {
        if change.became_active {
            let at = change.timestamp;
            self.focus_gained(change.app(), at).await;
        } else {
            self.focus_lost(&change.app_id, change.timestamp).await;
        }
    }

    /// A repeated gain for the app already being tracked leaves the open
    /// session untouched.
    pub async fn focus_gained(&mut self, mut app: FocusedApp, at: DateTime<Utc>) {
        if matches!(&self.state, TrackerState::Tracking(session) if session.app_id == app.app_id) {
            debug!("Ignoring duplicate focus-gained for {}", app.app_id);
            return;
        }

        self.close_current(at).await;

        if self.exclusions.is_excluded(&app.app_id).await {
            debug!("Not tracking excluded app {}", app.app_id);
            return;
        }

        if !self.capture_window_titles {
            app.window_title = None;
        }

        let session = Session::begin(app, at);
        debug!("Session opened: {} ({})", session.app_name, session.id);
        self.state = TrackerState::Tracking(session);
    }

    /// Returns `false` when the event does not match the open session and
    /// was ignored.
    pub async fn focus_lost(&mut self, app_id: &str, at: DateTime<Utc>) -> bool {
        let is_current =
            matches!(&self.state, TrackerState::Tracking(session) if session.app_id == app_id);

        if !is_current {
            debug!("Ignoring stale focus-lost for {}", app_id);
            return false;
        }

        self.close_current(at).await;
        true
    }

    /// Saves sessions left over from failed closes, then drains the visit
    /// buffer. Session saves are upserts, so a repeat is harmless.
    pub async fn flush(&mut self) -> FlushOutcome {
        self.save_unsaved_sessions().await;
        self.buffer.flush(self.store.as_ref(), &self.retry).await
    }

    async fn save_unsaved_sessions(&mut self) {
        if self.unsaved_sessions.is_empty() {
            return;
        }

        let mut pending = std::mem::take(&mut self.unsaved_sessions).into_iter();
        while let Some(session) = pending.next() {
            match self.retry.run("save session", || self.store.save_session(&session)).await {
                Ok(()) => debug!("Saved deferred session {}", session.id),
                Err(e) if e.is_transient() => {
                    warn!("Store unavailable, deferring {} sessions: {}", pending.len() + 1, e);
                    self.unsaved_sessions.push(session);
                    self.unsaved_sessions.extend(pending.by_ref());
                    break;
                }
                Err(e) => {
                    warn!("Failed to save session {} for {}: {}", session.id, session.app_id, e);
                    self.unsaved_sessions.push(session);
                }
            }
        }
    }

    /// Closes any open session, then drains the visit buffer.
    pub async fn shutdown(&mut self, at: DateTime<Utc>) -> FlushOutcome {
        self.close_current(at).await;
        let outcome = self.flush().await;

        if !self.unsaved_sessions.is_empty() {
            error!("{} sessions could not be saved before shutdown", self.unsaved_sessions.len());
        }

        if outcome.requeued > 0 {
            error!("{} visits could not be saved before shutdown", outcome.requeued);
        } else {
            info!("Tracker drained, {} visits saved", outcome.persisted);
        }

        outcome
    }

    async fn close_current(&mut self, at: DateTime<Utc>) -> Option<Session> {
        let TrackerState::Tracking(mut session) = std::mem::replace(&mut self.state, TrackerState::Idle)
        else {
            return None;
        };

        session.close(at);

        if let Err(e) = self.retry.run("save session", || self.store.save_session(&session)).await {
            warn!(
                "Failed to save session {} for {}, keeping it for the next flush: {}",
                session.id, session.app_id, e
            );
            self.unsaved_sessions.push(session.clone());
        }

        let visit = Visit::from_session(&session, self.previous_app.take());
        self.buffer.push(visit);
        self.previous_app = Some(session.app_id.clone());

        debug!("Session closed: {} after {:.1}s", session.app_name, session.duration_at(at));
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn app(id: &str) -> FocusedApp {
        FocusedApp::new(id, id.to_uppercase())
    }

    fn new_tracker(store: &Arc<MemoryStore>) -> SessionTracker {
        let exclusions = Arc::new(ExclusionList::empty(store.clone()));
        SessionTracker::new(store.clone(), exclusions).with_retry_policy(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_switching_apps_closes_previous_session() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        tracker.focus_gained(app("b"), at(40)).await;

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].app_id, "a");
        assert_eq!(sessions[0].duration(), 40.0);
        assert!(!sessions[0].is_active);
        assert_eq!(tracker.current_session().unwrap().app_id, "b");
        assert_eq!(tracker.pending_visits(), 1);
    }

    #[tokio::test]
    async fn test_previous_app_chain() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        tracker.focus_gained(app("b"), at(40)).await;
        tracker.focus_lost("b", at(45)).await;
        tracker.flush().await;

        let visits = store.visits();
        assert_eq!(visits[0].previous_app_id, None);
        assert_eq!(visits[1].previous_app_id.as_deref(), Some("a"));
        assert_eq!(tracker.previous_app(), Some("b"));
        assert_eq!(tracker.state(), &TrackerState::Idle);
    }

    #[tokio::test]
    async fn test_stale_focus_lost_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        assert!(!tracker.focus_lost("b", at(5)).await);
        assert_eq!(tracker.current_session().unwrap().app_id, "a");

        assert!(tracker.focus_lost("a", at(10)).await);
        assert!(!tracker.focus_lost("a", at(11)).await);
        assert_eq!(store.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_excluded_app_opens_nothing_and_keeps_previous() {
        let store = Arc::new(MemoryStore::new());
        let exclusions = Arc::new(ExclusionList::empty(store.clone()));
        exclusions.add("vault", "Vault").await.unwrap();
        let mut tracker = SessionTracker::new(store.clone(), exclusions);

        tracker.focus_gained(app("a"), at(0)).await;
        tracker.focus_gained(app("vault"), at(20)).await;
        assert_eq!(tracker.state(), &TrackerState::Idle);
        assert_eq!(tracker.previous_app(), Some("a"));

        tracker.focus_gained(app("b"), at(60)).await;
        tracker.shutdown(at(70)).await;

        let visits = store.visits();
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[1].app_id, "b");
        assert_eq!(visits[1].previous_app_id.as_deref(), Some("a"));
        assert!(store.sessions().iter().all(|s| s.app_id != "vault"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_and_drains() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        let outcome = tracker.shutdown(at(30)).await;

        assert_eq!(outcome, FlushOutcome { persisted: 1, requeued: 0 });
        assert_eq!(tracker.pending_visits(), 0);
        assert_eq!(store.sessions().len(), 1);
        assert!(tracker.current_session().is_none());
    }

    #[tokio::test]
    async fn test_session_save_failure_does_not_block_visit() {
        let store = Arc::new(MemoryStore::new());
        store.fail_sessions();
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        tracker.focus_gained(app("b"), at(5)).await;

        assert!(store.sessions().is_empty());
        assert_eq!(tracker.pending_visits(), 1);
        assert_eq!(tracker.pending_sessions(), 1);
        assert_eq!(tracker.current_session().unwrap().app_id, "b");

        store.clear_failures();
        let outcome = tracker.flush().await;
        assert_eq!(outcome, FlushOutcome { persisted: 1, requeued: 0 });
        assert_eq!(tracker.pending_sessions(), 0);
        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].app_id, "a");
        assert_eq!(sessions[0].end, Some(at(5)));
    }

    #[tokio::test]
    async fn test_unsaved_sessions_survive_an_outage() {
        let store = Arc::new(MemoryStore::new());
        store.go_offline();
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        tracker.focus_gained(app("b"), at(10)).await;
        tracker.focus_gained(app("c"), at(20)).await;
        let outcome = tracker.flush().await;

        assert_eq!(outcome, FlushOutcome { persisted: 0, requeued: 2 });
        assert_eq!(tracker.pending_sessions(), 2);

        store.clear_failures();
        let outcome = tracker.shutdown(at(30)).await;
        assert_eq!(outcome, FlushOutcome { persisted: 3, requeued: 0 });
        assert_eq!(tracker.pending_sessions(), 0);
        let mut ids: Vec<_> = store.sessions().into_iter().map(|s| s.app_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.visits().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_focus_gained_keeps_open_session() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);

        tracker.focus_gained(app("a"), at(0)).await;
        let opened = tracker.current_session().unwrap().id;
        tracker.focus_gained(app("a"), at(30)).await;

        let session = tracker.current_session().unwrap();
        assert_eq!(session.id, opened);
        assert_eq!(session.start, at(0));
        assert!(store.sessions().is_empty());
        assert_eq!(tracker.pending_visits(), 0);

        tracker.shutdown(at(60)).await;
        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration(), 60.0);
    }

    #[tokio::test]
    async fn test_window_titles_only_when_enabled() {
        let store = Arc::new(MemoryStore::new());
        let titled = app("a").with_window_title("inbox");

        let mut tracker = new_tracker(&store);
        tracker.focus_gained(titled.clone(), at(0)).await;
        assert_eq!(tracker.current_session().unwrap().window_title, None);

        let mut tracker = new_tracker(&store).with_window_titles(true);
        tracker.focus_gained(titled, at(0)).await;
        assert_eq!(tracker.current_session().unwrap().window_title.as_deref(), Some("inbox"));
    }

    #[tokio::test]
    async fn test_live_session_is_recomputed() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = new_tracker(&store);
        assert!(tracker.live_session(at(0)).is_none());

        tracker.focus_gained(app("a"), at(0)).await;
        assert_eq!(tracker.live_session(at(1)).unwrap().duration_secs, 1.0);
        assert_eq!(tracker.live_session(at(2)).unwrap().duration_secs, 2.0);
    }
}
