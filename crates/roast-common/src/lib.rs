pub mod config;
pub mod format;
pub mod stats;
pub mod time;
pub mod types;

pub use stats::*;
pub use time::Calendar;
pub use types::*;
