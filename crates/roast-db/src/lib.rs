pub mod connection;
pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{DbError, Result};
pub use models::*;
pub use queries::DeletedCounts;
pub use store::{ActivityStore, ExclusionStore, ReportStore};
