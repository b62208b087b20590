//! Focus-change input. The OS-level watcher is an external process that
//! writes one JSON object per line; the daemon only consumes that stream.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roast_common::FocusedApp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusChange {
    pub app_id: String,
    pub app_name: String,
    #[serde(default)]
    pub window_title: Option<String>,
    pub became_active: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl FocusChange {
    pub fn gained(app: FocusedApp, timestamp: DateTime<Utc>) -> Self {
        Self {
            app_id: app.app_id,
            app_name: app.app_name,
            window_title: app.window_title,
            became_active: true,
            timestamp,
        }
    }

    pub fn lost(app_id: impl Into<String>, app_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            window_title: None,
            became_active: false,
            timestamp,
        }
    }

    pub fn app(&self) -> FocusedApp {
        FocusedApp {
            app_id: self.app_id.clone(),
            app_name: self.app_name.clone(),
            window_title: self.window_title.clone(),
        }
    }
}

#[async_trait]
pub trait FocusEventSource: Send {
    /// Next change, or `None` once the source is exhausted.
    async fn next_change(&mut self) -> Result<Option<FocusChange>>;

    /// The application focused right now, if the source can tell.
    async fn frontmost_app(&mut self) -> Result<Option<FocusedApp>> {
        Ok(None)
    }
}

/// Reads newline-delimited JSON focus changes. Blank lines are skipped and
/// malformed lines are logged and dropped.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FocusEventSource for JsonLinesSource<R> {
    async fn next_change(&mut self) -> Result<Option<FocusChange>> {
        loop {
            let Some(line) = self.lines.next_line().await.context("Failed to read focus event")? else {
                return Ok(None);
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<FocusChange>(line) {
                Ok(change) => return Ok(Some(change)),
                Err(e) => warn!("Skipping malformed focus event: {}", e),
            }
        }
    }
}

/// Pumps `source` into the monitor's bounded channel until either side closes.
pub fn spawn_forwarder<S>(mut source: S, tx: mpsc::Sender<FocusChange>) -> JoinHandle<()>
where
    S: FocusEventSource + 'static,
{
    tokio::spawn(async move {
        loop {
            match source.next_change().await {
                Ok(Some(change)) => {
                    debug!("Focus change: {} active={}", change.app_id, change.became_active);
                    if tx.send(change).await.is_err() {
                        debug!("Monitor stopped, focus forwarder exiting");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Focus event source exhausted");
                    break;
                }
                Err(e) => {
                    warn!("Focus event source failed: {:#}", e);
                    break;
                }
            }
        }
    })
}
