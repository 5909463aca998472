pub mod generation_service;
pub mod grouping;
pub mod image_loader;
pub mod layout;
pub mod publisher;
pub mod renderer;
pub mod report_repository;
pub mod window;

#[cfg(test)]
pub mod test_fakes;

pub use generation_service::{BranchFailure, GeneratedReport, GenerationSummary, WeeklyReportService};
pub use publisher::{DeleteOutcome, NotificationOutcome};
pub use report_repository::PgReportRepository;
