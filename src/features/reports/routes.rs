use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportState};
use crate::features::reports::services::WeeklyReportService;

/// Create routes for the reports feature
///
/// All routes require the auth middleware to be applied by the caller
pub fn routes(report_service: Arc<WeeklyReportService>) -> Router {
    let state = ReportState { report_service };

    Router::new()
        .route("/api/reports", get(handlers::list_reports))
        .route("/api/reports/generate", post(handlers::generate_reports))
        .route(
            "/api/reports/{id}",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        .with_state(state)
}
