use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers, models as reports_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::generate_reports,
        reports_handlers::list_reports,
        reports_handlers::get_report,
        reports_handlers::delete_report,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reports
            reports_models::ReportKind,
            reports_dtos::GenerateReportsRequestDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::NotificationStatus,
            reports_dtos::NotificationDto,
            reports_dtos::GeneratedReportDto,
            reports_dtos::BranchFailureDto,
            reports_dtos::GenerationSummaryDto,
            reports_dtos::DeleteReportResponseDto,
            ApiResponse<reports_dtos::GenerationSummaryDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<reports_dtos::DeleteReportResponseDto>,
        )
    ),
    tags(
        (name = "reports", description = "Weekly photographic maintenance reports"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Condo Reports API",
        version = "0.1.0",
        description = "Weekly maintenance photo reports for condominium administration",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
