use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    CreateWeeklyReport, MaintenanceImage, MaintenanceRecord, MaintenanceRecordRow,
    ReportVisibility, WeeklyReport,
};
use crate::features::reports::services::window::ReportWindow;
use crate::shared::types::PaginationQuery;

/// Persistence used by the report pipeline
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Every record starting inside the window, with images and department attached
    async fn fetch_records_in_window(&self, window: &ReportWindow)
        -> Result<Vec<MaintenanceRecord>>;

    async fn create_report(&self, data: &CreateWeeklyReport) -> Result<WeeklyReport>;

    /// Newest first, with the total count of visible reports
    async fn list_reports(
        &self,
        visibility: &ReportVisibility,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<WeeklyReport>, i64)>;

    async fn get_report(&self, id: Uuid) -> Result<Option<WeeklyReport>>;

    /// Returns whether a row was deleted
    async fn delete_report(&self, id: Uuid) -> Result<bool>;
}

const REPORT_COLUMNS: &str = r#"
    r.id, r.kind, r.window_start, r.window_end, r.url, r.department_id,
    d.number AS department_number, d.tower AS department_tower,
    r.created_at
"#;

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_images(&self, record_ids: &[Uuid]) -> Result<Vec<MaintenanceImage>> {
        sqlx::query_as::<_, MaintenanceImage>(
            r#"
            SELECT id, maintenance_id, url, storage_id, caption, category, display_order, created_at
            FROM maintenance_images
            WHERE maintenance_id = ANY($1)
            ORDER BY display_order ASC, created_at ASC
            "#,
        )
        .bind(record_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch maintenance images: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn fetch_records_in_window(
        &self,
        window: &ReportWindow,
    ) -> Result<Vec<MaintenanceRecord>> {
        let rows = sqlx::query_as::<_, MaintenanceRecordRow>(
            r#"
            SELECT
                m.id, m.title, m.description, m.kind, m.scope, m.department_id,
                m.start_date, m.end_date, m.cost, m.notes, m.status, m.created_at,
                d.number AS department_number,
                d.tower AS department_tower,
                d.floor AS department_floor,
                d.owner_name, d.owner_email, d.owner_phone,
                d.active AS department_active
            FROM maintenance_records m
            LEFT JOIN departments d ON d.id = m.department_id
            WHERE m.start_date >= $1 AND m.start_date <= $2
            ORDER BY m.start_date ASC, m.created_at ASC
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch maintenance records: {:?}", e);
            AppError::Database(e)
        })?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut images_by_record: HashMap<Uuid, Vec<MaintenanceImage>> = HashMap::new();
        for image in self.fetch_images(&ids).await? {
            images_by_record
                .entry(image.maintenance_id)
                .or_default()
                .push(image);
        }

        let records = rows
            .into_iter()
            .map(|row| {
                let mut record = MaintenanceRecord::from(row);
                record.images = images_by_record.remove(&record.id).unwrap_or_default();
                record
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Fetched {} maintenance records between {} and {}",
            records.len(),
            window.start,
            window.end
        );

        Ok(records)
    }

    async fn create_report(&self, data: &CreateWeeklyReport) -> Result<WeeklyReport> {
        let query = format!(
            r#"
            WITH r AS (
                INSERT INTO weekly_reports (kind, window_start, window_end, url, department_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, kind, window_start, window_end, url, department_id, created_at
            )
            SELECT {REPORT_COLUMNS}
            FROM r
            LEFT JOIN departments d ON d.id = r.department_id
            "#
        );

        let report = sqlx::query_as::<_, WeeklyReport>(&query)
            .bind(data.kind)
            .bind(data.window_start)
            .bind(data.window_end)
            .bind(&data.url)
            .bind(data.department_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create weekly report: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Created {} report: {}", report.kind, report.id);
        Ok(report)
    }

    async fn list_reports(
        &self,
        visibility: &ReportVisibility,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<WeeklyReport>, i64)> {
        let (see_all, department_ids) = match visibility {
            ReportVisibility::All => (true, Vec::new()),
            ReportVisibility::Owner { department_ids } => (false, department_ids.clone()),
        };

        let filter = "($1 OR r.kind = 'general' OR r.department_id = ANY($2))";

        let query = format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM weekly_reports r
            LEFT JOIN departments d ON d.id = r.department_id
            WHERE {filter}
            ORDER BY r.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );

        let reports = sqlx::query_as::<_, WeeklyReport>(&query)
            .bind(see_all)
            .bind(&department_ids)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list weekly reports: {:?}", e);
                AppError::Database(e)
            })?;

        let count_query = format!("SELECT COUNT(*) FROM weekly_reports r WHERE {filter}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(see_all)
            .bind(&department_ids)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count weekly reports: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((reports, total))
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<WeeklyReport>> {
        let query = format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM weekly_reports r
            LEFT JOIN departments d ON d.id = r.department_id
            WHERE r.id = $1
            "#
        );

        sqlx::query_as::<_, WeeklyReport>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get weekly report {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn delete_report(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM weekly_reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete weekly report {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
