use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Local;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    DeleteReportResponseDto, GenerateReportsRequestDto, GenerationSummaryDto, ReportResponseDto,
};
use crate::features::reports::services::{window, WeeklyReportService};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub report_service: Arc<WeeklyReportService>,
}

/// Generate the general and per-department reports of a week (admin only)
#[utoipa::path(
    post,
    path = "/api/reports/generate",
    request_body = GenerateReportsRequestDto,
    responses(
        (status = 200, description = "Generation finished", body = ApiResponse<GenerationSummaryDto>),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn generate_reports(
    RequireAdmin(user): RequireAdmin,
    State(state): State<ReportState>,
    AppJson(dto): AppJson<GenerateReportsRequestDto>,
) -> Result<Json<ApiResponse<GenerationSummaryDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let window = window::resolve(
        dto.start_date.as_deref(),
        dto.end_date.as_deref(),
        &Local::now(),
    )?;

    tracing::info!(
        user_id = %user.user_id,
        "Generating weekly reports for {} - {}",
        window.start,
        window.end
    );

    let summary = state.report_service.generate(window).await?;

    let message = match summary.reports_generated() {
        0 if summary.failures.is_empty() => {
            "No hay mantenimientos en el rango de fechas especificado".to_string()
        }
        n => format!("Se generaron {} reportes", n),
    };

    Ok(Json(ApiResponse::success(
        Some(summary.into()),
        Some(message),
        None,
    )))
}

/// List reports visible to the authenticated user
#[utoipa::path(
    get,
    path = "/api/reports",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Visible reports, newest first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 400, description = "Invalid pagination"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    pagination
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (reports, total) = state.report_service.list(&user, &pagination).await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get a report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Report belongs to another department"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn get_report(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = state.report_service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Delete a report and its stored PDF (admin only)
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted", body = ApiResponse<DeleteReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn delete_report(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<ReportState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteReportResponseDto>>> {
    let outcome = state.report_service.delete(id).await?;

    let message = if outcome.storage_deleted {
        "Reporte eliminado"
    } else {
        "Reporte eliminado; el archivo no pudo borrarse del almacenamiento"
    };

    Ok(Json(ApiResponse::success(
        Some(DeleteReportResponseDto::new(id, outcome)),
        Some(message.to_string()),
        None,
    )))
}
