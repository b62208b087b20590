use anyhow::{Context, Result};
use chrono::Utc;
use roast_common::Calendar;
use roast_db::{Database, DatabaseConfig};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analytics::StatsAssembler;
use crate::config::DaemonConfig;
use crate::events::{spawn_forwarder, FocusEventSource, JsonLinesSource};
use crate::exclusions::ExclusionList;
use crate::monitor::FocusMonitor;
use crate::scheduler::SystemClock;
use crate::tracker::SessionTracker;

pub async fn initialize_database(config: &DaemonConfig) -> Result<Arc<Database>> {
    info!("Initializing database");

    let database_config = DatabaseConfig { path: config.database_path() };
    let database = Database::open(database_config).await.context("Failed to open database")?;

    info!("Database initialized successfully");
    Ok(Arc::new(database))
}

/// Tracks focus changes read as JSON lines from stdin until a shutdown
/// signal arrives or the watcher closes the stream.
pub async fn run(config: DaemonConfig) -> Result<()> {
    info!("Initializing daemon");

    let database = initialize_database(&config).await?;
    let week_starts_on = config.analytics.week_start()?;

    let exclusions = match ExclusionList::load(database.clone()).await {
        Ok(list) => list,
        Err(e) => {
            warn!("Failed to load excluded apps, tracking everything: {}", e);
            ExclusionList::empty(database.clone())
        }
    };

    let tracker = SessionTracker::new(database.clone(), Arc::new(exclusions))
        .with_retry_policy(config.tracking.retry_policy())
        .with_window_titles(config.tracking.capture_window_titles);

    let mut source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
    let frontmost = match source.frontmost_app().await {
        Ok(app) => app,
        Err(e) => {
            warn!("Could not read frontmost app: {:#}", e);
            None
        }
    };

    let (event_tx, event_rx) = mpsc::channel(config.tracking.event_channel_capacity);
    let mut forwarder = spawn_forwarder(source, event_tx);

    let monitor = FocusMonitor::new(
        tracker,
        Arc::new(SystemClock),
        config.tracking.refresh_interval(),
        config.tracking.flush_interval(),
    )
    .start(event_rx, frontmost);

    let mut live = monitor.live();
    tokio::spawn(async move {
        while live.changed().await.is_ok() {
            if let Some(session) = live.borrow_and_update().as_ref() {
                debug!("{} active for {:.0}s", session.app_name, session.duration_secs);
            }
        }
    });

    info!("Daemon running, waiting for shutdown signal...");

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
            _ = &mut forwarder => {
                info!("Focus event stream ended, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
            _ = &mut forwarder => {
                info!("Focus event stream ended, shutting down...");
            }
        }
    }

    let tracker = monitor.stop().await?;
    forwarder.abort();

    if tracker.pending_sessions() > 0 {
        warn!("{} sessions could not be persisted before shutdown", tracker.pending_sessions());
    }
    if tracker.pending_visits() > 0 {
        warn!("{} visits could not be persisted before shutdown", tracker.pending_visits());
    }

    let assembler = StatsAssembler::new(database.clone(), Calendar::local(week_starts_on))
        .with_compulsive_window_days(config.analytics.compulsive_window_days);
    match assembler.today_stats(Utc::now(), None).await {
        Ok(today) => info!(
            "Today: {:.0}s active, {} context switches, {} deep work minutes",
            today.total_active_time, today.context_switches, today.deep_work_minutes
        ),
        Err(e) => warn!("Failed to compute today's stats: {}", e),
    }

    Database::clone(&database).close().await;
    info!("Daemon shutdown complete");

    Ok(())
}
