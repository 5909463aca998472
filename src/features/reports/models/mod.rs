mod maintenance;
mod weekly_report;

pub use maintenance::{
    Department, MaintenanceImage, MaintenanceKind, MaintenanceRecord, MaintenanceRecordRow,
    MaintenanceScope, MaintenanceStatus,
};
pub use weekly_report::{CreateWeeklyReport, ReportKind, ReportVisibility, WeeklyReport};
