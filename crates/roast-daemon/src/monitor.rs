use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use roast_common::FocusedApp;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::FocusChange;
use crate::scheduler::{Clock, Scheduler, Tick};
use crate::tracker::{LiveSession, SessionTracker};

/// Runs the tracker on one task. Focus changes, refresh ticks and flush
/// ticks are handled strictly one at a time.
pub struct FocusMonitor {
    tracker: SessionTracker,
    clock: Arc<dyn Clock>,
    refresh_every: Duration,
    flush_every: Duration,
}

pub struct MonitorHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    live_rx: watch::Receiver<Option<LiveSession>>,
    task: JoinHandle<SessionTracker>,
}

impl FocusMonitor {
    pub fn new(
        tracker: SessionTracker,
        clock: Arc<dyn Clock>,
        refresh_every: Duration,
        flush_every: Duration,
    ) -> Self {
        Self { tracker, clock, refresh_every, flush_every }
    }

    /// Spawns the loop. If `frontmost` is known, a focus-gained for it,
    /// stamped with the time of this call, is applied before any queued event.
    pub fn start(
        self,
        events: mpsc::Receiver<FocusChange>,
        frontmost: Option<FocusedApp>,
    ) -> MonitorHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (live_tx, live_rx) = watch::channel(None);

        info!("Starting focus monitor");
        let frontmost = frontmost.map(|app| (app, self.clock.now()));
        let task = tokio::spawn(self.run(events, stop_rx, live_tx, frontmost));

        MonitorHandle { stop_tx: Some(stop_tx), live_rx, task }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<FocusChange>,
        mut stop_rx: oneshot::Receiver<()>,
        live_tx: watch::Sender<Option<LiveSession>>,
        frontmost: Option<(FocusedApp, DateTime<Utc>)>,
    ) -> SessionTracker {
        let mut scheduler = Scheduler::new(self.refresh_every, self.flush_every);

        if let Some((app, started)) = frontmost {
            debug!("Frontmost app at start: {}", app.app_id);
            self.tracker.focus_gained(app, started).await;
        }
        self.publish(&live_tx);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    debug!("Focus monitor received stop");
                    break;
                }
                change = events.recv() => match change {
                    Some(change) => {
                        self.tracker.apply(change).await;
                        self.publish(&live_tx);
                    }
                    None => {
                        info!("Focus event channel closed");
                        break;
                    }
                },
                tick = scheduler.tick() => match tick {
                    Tick::Refresh => self.publish(&live_tx),
                    Tick::Flush => {
                        self.tracker.flush().await;
                    }
                },
            }
        }

        drop(scheduler);

        events.close();
        while let Ok(change) = events.try_recv() {
            self.tracker.apply(change).await;
        }

        self.tracker.shutdown(self.clock.now()).await;
        self.publish(&live_tx);
        self.tracker
    }

    fn publish(&self, live_tx: &watch::Sender<Option<LiveSession>>) {
        live_tx.send_replace(self.tracker.live_session(self.clock.now()));
    }
}

impl MonitorHandle {
    pub fn live(&self) -> watch::Receiver<Option<LiveSession>> {
        self.live_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits for the open session to be closed and every
    /// pending visit to be flushed.
    pub async fn stop(mut self) -> Result<SessionTracker> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The loop may already have exited on its own.
            let _ = stop_tx.send(());
        }

        let tracker = self.task.await.context("Focus monitor task failed")?;
        info!("Focus monitor stopped");
        Ok(tracker)
    }
}
