use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::models::{ReportKind, WeeklyReport};
use crate::features::reports::services::{
    BranchFailure, DeleteOutcome, GeneratedReport, GenerationSummary, NotificationOutcome,
};

/// Request DTO for generating the weekly reports
///
/// Both bounds accept RFC 3339 timestamps or `YYYY-MM-DD` dates. When either
/// is missing the current week (Monday to Sunday) is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct GenerateReportsRequestDto {
    #[serde(default, alias = "semanaInicio")]
    #[validate(length(max = 64, message = "start_date is too long"))]
    #[schema(example = "2025-01-06")]
    pub start_date: Option<String>,

    #[serde(default, alias = "semanaFin")]
    #[validate(length(max = 64, message = "end_date is too long"))]
    #[schema(example = "2025-01-12T23:59:59.999Z")]
    pub end_date: Option<String>,
}

/// Response DTO for a stored report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub kind: ReportKind,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub url: String,
    pub department_id: Option<Uuid>,
    pub department_number: Option<String>,
    pub department_tower: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WeeklyReport> for ReportResponseDto {
    fn from(r: WeeklyReport) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            window_start: r.window_start,
            window_end: r.window_end,
            url: r.url,
            department_id: r.department_id,
            department_number: r.department_number,
            department_tower: r.department_tower,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Skipped,
    Failed,
}

/// What happened to the owner email of a report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub status: NotificationStatus,
    pub detail: Option<String>,
}

impl From<NotificationOutcome> for NotificationDto {
    fn from(outcome: NotificationOutcome) -> Self {
        match outcome {
            NotificationOutcome::Sent => Self {
                status: NotificationStatus::Sent,
                detail: None,
            },
            NotificationOutcome::Skipped(reason) => Self {
                status: NotificationStatus::Skipped,
                detail: Some(reason),
            },
            NotificationOutcome::Failed(error) => Self {
                status: NotificationStatus::Failed,
                detail: Some(error),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedReportDto {
    #[serde(flatten)]
    pub report: ReportResponseDto,
    pub notification: NotificationDto,
}

impl From<GeneratedReport> for GeneratedReportDto {
    fn from(g: GeneratedReport) -> Self {
        Self {
            report: g.report.into(),
            notification: g.notification.into(),
        }
    }
}

/// A report that could not be produced
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BranchFailureDto {
    pub kind: ReportKind,
    pub department_id: Option<Uuid>,
    pub label: String,
    pub error: String,
}

impl From<BranchFailure> for BranchFailureDto {
    fn from(f: BranchFailure) -> Self {
        Self {
            kind: f.kind,
            department_id: f.department_id,
            label: f.label,
            error: f.error,
        }
    }
}

/// Response DTO for a generation run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationSummaryDto {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub reports_generated: usize,
    pub reports: Vec<GeneratedReportDto>,
    pub failures: Vec<BranchFailureDto>,
}

impl From<GenerationSummary> for GenerationSummaryDto {
    fn from(s: GenerationSummary) -> Self {
        Self {
            window_start: s.window.start,
            window_end: s.window.end,
            reports_generated: s.reports_generated(),
            reports: s.reports.into_iter().map(Into::into).collect(),
            failures: s.failures.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response DTO for report deletion
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteReportResponseDto {
    pub id: Uuid,
    pub storage_deleted: bool,
    pub storage_error: Option<String>,
}

impl DeleteReportResponseDto {
    pub fn new(id: Uuid, outcome: DeleteOutcome) -> Self {
        Self {
            id,
            storage_deleted: outcome.storage_deleted,
            storage_error: outcome.storage_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_spanish_aliases() {
        let dto: GenerateReportsRequestDto = serde_json::from_str(
            r#"{"semanaInicio": "2025-01-06", "semanaFin": "2025-01-12"}"#,
        )
        .unwrap();
        assert_eq!(dto.start_date.as_deref(), Some("2025-01-06"));
        assert_eq!(dto.end_date.as_deref(), Some("2025-01-12"));

        let empty: GenerateReportsRequestDto = serde_json::from_str("{}").unwrap();
        assert!(empty.start_date.is_none() && empty.end_date.is_none());
    }

    #[test]
    fn test_notification_serialization() {
        let dto = NotificationDto::from(NotificationOutcome::Skipped("no email".to_string()));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["detail"], "no email");
    }
}
