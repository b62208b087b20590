//! Time sources and the periodic ticks that drive the monitor loop.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Recompute the live session duration
    Refresh,
    /// Persist buffered visits
    Flush,
}

/// Issues refresh and flush ticks. Dropping it cancels both timers.
pub struct Scheduler {
    refresh: Interval,
    flush: Interval,
}

impl Scheduler {
    pub fn new(refresh_every: Duration, flush_every: Duration) -> Self {
        let now = Instant::now();

        let mut refresh = interval_at(now + refresh_every, refresh_every);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut flush = interval_at(now + flush_every, flush_every);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { refresh, flush }
    }

    /// Waits for the next tick. A flush due at the same instant as a refresh
    /// is delivered first.
    pub async fn tick(&mut self) -> Tick {
        tokio::select! {
            biased;
            _ = self.flush.tick() => Tick::Flush,
            _ = self.refresh.tick() => Tick::Refresh,
        }
    }
}
