pub mod analytics;
pub mod buffer;
pub mod config;
pub mod daemon;
pub mod events;
pub mod exclusions;
pub mod monitor;
pub mod reports;
pub mod retry;
pub mod scheduler;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use analytics::{PatternDetector, StatsAssembler};
pub use config::DaemonConfig;
pub use exclusions::ExclusionList;
pub use monitor::{FocusMonitor, MonitorHandle};
pub use reports::{DigestWriter, ReportService, ReportWriter, ShareableRoast};
pub use tracker::{LiveSession, SessionTracker, TrackerState};
