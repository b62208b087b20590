pub mod excluded_apps;
pub mod maintenance;
pub mod reports;
pub mod sessions;
pub mod visits;

pub use excluded_apps::ExcludedAppQueries;
pub use maintenance::{DeletedCounts, MaintenanceQueries};
pub use reports::ReportQueries;
pub use sessions::SessionQueries;
pub use visits::VisitQueries;
