use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::core::config::{CompanyConfig, ReportConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{Department, ReportKind, ReportVisibility, WeeklyReport};
use crate::features::reports::services::grouping::{group_images, partition_records, CategoryGroups};
use crate::features::reports::services::image_loader::ImageLoader;
use crate::features::reports::services::publisher::{
    DeleteOutcome, NotificationOutcome, ReportArtifact, ReportPublisher,
};
use crate::features::reports::services::renderer::{render_report, ReportDocument};
use crate::features::reports::services::report_repository::ReportRepository;
use crate::features::reports::services::window::{format_day, ReportWindow};
use crate::modules::email::EmailSender;
use crate::modules::images::ImageFetcher;
use crate::modules::storage::ObjectStorage;
use crate::shared::types::PaginationQuery;

const GENERAL_TITLE: &str = "REPORTE FOTOGRÁFICO SEMANAL";
const GENERAL_DESTINATION: &str = "ÁREAS COMUNES";
const GENERAL_CONTACT: &str = "Administración";
const GENERAL_ROLE: &str = "Gerente de Mantenimiento";
const DEPARTMENT_TITLE: &str = "REPORTE FOTOGRÁFICO";
const DEPARTMENT_ROLE: &str = "Propietario";

/// One report produced by a generation run
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report: WeeklyReport,
    pub notification: NotificationOutcome,
}

/// A branch that produced no report
#[derive(Debug, Clone)]
pub struct BranchFailure {
    pub kind: ReportKind,
    pub department_id: Option<Uuid>,
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub window: ReportWindow,
    pub reports: Vec<GeneratedReport>,
    pub failures: Vec<BranchFailure>,
}

impl GenerationSummary {
    fn new(window: ReportWindow) -> Self {
        Self {
            window,
            reports: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn reports_generated(&self) -> usize {
        self.reports.len()
    }
}

/// Everything needed to render and publish one branch
struct BranchPlan {
    kind: ReportKind,
    label: String,
    department: Option<Department>,
    groups: CategoryGroups,
    document: DocumentHeader,
    file_name_hint: String,
}

struct DocumentHeader {
    title: String,
    destination: String,
    contact_name: Option<String>,
    contact_role: String,
}

/// Weekly photographic report pipeline
pub struct WeeklyReportService {
    repository: Arc<dyn ReportRepository>,
    publisher: ReportPublisher,
    images: ImageLoader,
    company: CompanyConfig,
}

impl WeeklyReportService {
    pub fn new(
        repository: Arc<dyn ReportRepository>,
        storage: Arc<dyn ObjectStorage>,
        email: Arc<dyn EmailSender>,
        fetcher: Arc<dyn ImageFetcher>,
        company: CompanyConfig,
        report_config: &ReportConfig,
    ) -> Self {
        let publisher = ReportPublisher::new(storage, repository.clone(), email, company.name.clone());
        let images = ImageLoader::new(fetcher, report_config.max_image_edge_px);

        Self {
            repository,
            publisher,
            images,
            company,
        }
    }

    /// Generate the general report and one report per department for the window.
    ///
    /// A failing branch is recorded in `failures` and does not stop the others.
    /// A failure to read the records aborts the whole run.
    pub async fn generate(&self, window: ReportWindow) -> Result<GenerationSummary> {
        let records = self.repository.fetch_records_in_window(&window).await?;
        let mut summary = GenerationSummary::new(window);

        if records.is_empty() {
            tracing::info!(
                "No maintenance records between {} and {}",
                window.start,
                window.end
            );
            return Ok(summary);
        }

        let buckets = partition_records(records);
        let start_stamp = window.file_stamp();

        let mut plans = Vec::with_capacity(buckets.departments.len() + 1);
        if !buckets.common_area.is_empty() {
            plans.push(BranchPlan {
                kind: ReportKind::General,
                label: GENERAL_DESTINATION.to_string(),
                department: None,
                groups: group_images(&buckets.common_area),
                document: DocumentHeader {
                    title: GENERAL_TITLE.to_string(),
                    destination: GENERAL_DESTINATION.to_string(),
                    contact_name: Some(GENERAL_CONTACT.to_string()),
                    contact_role: GENERAL_ROLE.to_string(),
                },
                file_name_hint: format!("reporte_general_{}", start_stamp),
            });
        }

        for bucket in buckets.departments {
            let department = bucket.department;
            let destination = department.destination_label();
            let contact = Some(department.owner_name.trim().to_string()).filter(|n| !n.is_empty());

            plans.push(BranchPlan {
                kind: ReportKind::Department,
                label: destination.clone(),
                groups: group_images(&bucket.records),
                document: DocumentHeader {
                    title: DEPARTMENT_TITLE.to_string(),
                    destination,
                    contact_name: contact,
                    contact_role: DEPARTMENT_ROLE.to_string(),
                },
                file_name_hint: format!("reporte_depto_{}_{}", department.number, start_stamp),
                department: Some(department),
            });
        }

        for plan in plans {
            let kind = plan.kind;
            let label = plan.label.clone();
            let department_id = plan.department.as_ref().map(|d| d.id);
            let span = tracing::info_span!("report_branch", %kind, branch = %label);

            match self.run_branch(&window, plan).instrument(span).await {
                Ok(generated) => summary.reports.push(generated),
                Err(e) => {
                    tracing::error!("Report for {} failed: {}", label, e);
                    summary.failures.push(BranchFailure {
                        kind,
                        department_id,
                        label,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Generated {} reports ({} failed) for {} - {}",
            summary.reports_generated(),
            summary.failures.len(),
            window.start,
            window.end
        );

        Ok(summary)
    }

    async fn run_branch(&self, window: &ReportWindow, plan: BranchPlan) -> Result<GeneratedReport> {
        let sections = self.images.load_sections(&plan.groups).await;
        tracing::debug!(
            "Rendering {} photos in {} sections",
            plan.groups.image_count(),
            sections.len()
        );

        let document = ReportDocument {
            title: plan.document.title,
            destination: plan.document.destination,
            contact_name: plan.document.contact_name,
            contact_role: plan.document.contact_role,
            description: Some(format!(
                "Trabajos realizados del {} al {}",
                format_day(window.local_start_date()),
                format_day(window.local_end_date())
            )),
            as_of: window.local_end_date(),
            sections,
        };

        let company = self.company.clone();
        let bytes = tokio::task::spawn_blocking(move || render_report(&document, &company))
            .await
            .map_err(|e| AppError::Internal(format!("Report rendering task failed: {}", e)))??;

        let outcome = self
            .publisher
            .publish(ReportArtifact {
                kind: plan.kind,
                window: *window,
                department: plan.department,
                file_name_hint: plan.file_name_hint,
                bytes,
            })
            .await?;

        Ok(GeneratedReport {
            report: outcome.report,
            notification: outcome.notification,
        })
    }

    /// Reports visible to the user, newest first, with the visible total
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<WeeklyReport>, i64)> {
        let visibility = ReportVisibility::for_user(user);
        self.repository.list_reports(&visibility, pagination).await
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<WeeklyReport> {
        let report = self
            .repository
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        if !ReportVisibility::for_user(user).allows(&report) {
            return Err(AppError::Forbidden(
                "You do not have access to this report".to_string(),
            ));
        }

        Ok(report)
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome> {
        let report = self
            .repository
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        self.publisher.delete(&report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::services::test_fakes::{
        common_record, department, department_record, fixture_window, image, png_bytes,
        InMemoryReportRepository, MemoryStorage, RecordingEmailSender, StaticImageFetcher,
    };
    use crate::shared::test_helpers::{create_admin_user, create_owner_user};
    use std::time::Duration;

    struct Harness {
        service: WeeklyReportService,
        repository: Arc<InMemoryReportRepository>,
        storage: Arc<MemoryStorage>,
        email: Arc<RecordingEmailSender>,
    }

    fn harness(repository: InMemoryReportRepository, storage: MemoryStorage) -> Harness {
        let repository = Arc::new(repository);
        let storage = Arc::new(storage);
        let email = Arc::new(RecordingEmailSender::default());
        let config = ReportConfig {
            image_fetch_timeout: Duration::from_secs(1),
            max_image_edge_px: 256,
        };

        let service = WeeklyReportService::new(
            repository.clone(),
            storage.clone(),
            email.clone(),
            Arc::new(StaticImageFetcher::default()),
            CompanyConfig::default(),
            &config,
        );

        Harness {
            service,
            repository,
            storage,
            email,
        }
    }

    #[tokio::test]
    async fn test_empty_window_generates_nothing() {
        let h = harness(InMemoryReportRepository::default(), MemoryStorage::default());

        let summary = h.service.generate(fixture_window()).await.unwrap();

        assert_eq!(summary.reports_generated(), 0);
        assert!(summary.failures.is_empty());
        assert!(h.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_general_and_department_reports() {
        let a = department("101", Some("a@example.com"));
        let b = department("202", None);
        let records = vec![
            common_record(vec![image(Some("LIMPIEZA"), 0), image(None, 1)]),
            department_record(&a, vec![image(Some("PINTURA"), 0)]),
            department_record(&b, vec![image(Some("REZANES"), 0)]),
            department_record(&a, vec![image(None, 0)]),
        ];
        let h = harness(
            InMemoryReportRepository::with_records(records),
            MemoryStorage::default(),
        );

        let summary = h.service.generate(fixture_window()).await.unwrap();

        assert_eq!(summary.reports_generated(), 3);
        assert!(summary.failures.is_empty());

        let kinds: Vec<ReportKind> = summary.reports.iter().map(|r| r.report.kind).collect();
        assert_eq!(
            kinds,
            vec![ReportKind::General, ReportKind::Department, ReportKind::Department]
        );

        let department_ids: Vec<Option<Uuid>> = summary
            .reports
            .iter()
            .map(|r| r.report.department_id)
            .collect();
        assert_eq!(department_ids, vec![None, Some(a.id), Some(b.id)]);

        assert_eq!(h.repository.reports().len(), 3);
        assert_eq!(h.email.sent().len(), 1);
        assert!(matches!(
            summary.reports[2].notification,
            NotificationOutcome::Skipped(_)
        ));

        let keys = h.storage.keys();
        assert!(keys.iter().any(|k| k.contains("reporte_general_")));
        assert!(keys.iter().any(|k| k.contains("reporte_depto_101_")));
        assert!(keys.iter().all(|k| k.ends_with(".pdf") && !k.ends_with(".pdf.pdf")));
    }

    #[tokio::test]
    async fn test_upload_failure_is_isolated_to_its_branch() {
        let a = department("101", Some("a@example.com"));
        let b = department("202", Some("b@example.com"));
        let records = vec![
            department_record(&a, vec![image(Some("PINTURA"), 0)]),
            department_record(&b, vec![image(Some("PINTURA"), 0)]),
        ];
        let h = harness(
            InMemoryReportRepository::with_records(records),
            MemoryStorage::failing_uploads_for("reporte_depto_101_"),
        );

        let summary = h.service.generate(fixture_window()).await.unwrap();

        assert_eq!(summary.reports_generated(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].department_id, Some(a.id));

        let stored = h.repository.reports();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].department_id, Some(b.id));
        assert_eq!(h.email.sent().len(), 1);
        assert_eq!(h.email.sent()[0].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_the_run() {
        let h = harness(
            InMemoryReportRepository::failing_fetch(),
            MemoryStorage::default(),
        );

        let result = h.service.generate(fixture_window()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_records_outside_window_are_ignored() {
        let mut late = common_record(vec![image(None, 0)]);
        late.start_date = fixture_window().end + chrono::Duration::milliseconds(1);
        let mut early = common_record(vec![image(None, 0)]);
        early.start_date = fixture_window().start - chrono::Duration::milliseconds(1);

        let h = harness(
            InMemoryReportRepository::with_records(vec![late, early]),
            MemoryStorage::default(),
        );
        let summary = h.service.generate(fixture_window()).await.unwrap();
        assert_eq!(summary.reports_generated(), 0);
    }

    #[tokio::test]
    async fn test_records_on_both_boundaries_are_reported() {
        let first = department("101", None);
        let last = department("202", None);
        let mut on_start = department_record(&first, vec![image(None, 0)]);
        on_start.start_date = fixture_window().start;
        let mut on_end = department_record(&last, vec![image(None, 0)]);
        on_end.start_date = fixture_window().end;

        let h = harness(
            InMemoryReportRepository::with_records(vec![on_start, on_end]),
            MemoryStorage::default(),
        );
        let summary = h.service.generate(fixture_window()).await.unwrap();

        assert_eq!(summary.reports_generated(), 2);
        let department_ids: Vec<Option<Uuid>> = summary
            .reports
            .iter()
            .map(|r| r.report.department_id)
            .collect();
        assert!(department_ids.contains(&Some(first.id)));
        assert!(department_ids.contains(&Some(last.id)));
    }

    #[tokio::test]
    async fn test_same_department_number_in_two_towers() {
        let mut tower_a = department("101", None);
        tower_a.tower = Some("A".to_string());
        let mut tower_b = department("101", None);
        tower_b.tower = Some("B".to_string());
        let records = vec![
            department_record(&tower_a, vec![image(None, 0)]),
            department_record(&tower_b, vec![image(None, 0)]),
        ];
        let h = harness(
            InMemoryReportRepository::with_records(records),
            MemoryStorage::default(),
        );

        let summary = h.service.generate(fixture_window()).await.unwrap();
        assert_eq!(summary.reports_generated(), 2);
        assert_ne!(summary.reports[0].report.url, summary.reports[1].report.url);
        assert_eq!(h.storage.keys().len(), 2);

        let outcome = h.service.delete(summary.reports[0].report.id).await.unwrap();
        assert!(outcome.storage_deleted);
        assert_eq!(h.storage.keys().len(), 1);

        let remaining = h.repository.reports();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, summary.reports[1].report.url);
    }

    #[tokio::test]
    async fn test_file_names_carry_utc_start_date() {
        let h = harness(
            InMemoryReportRepository::with_records(vec![common_record(vec![image(None, 0)])]),
            MemoryStorage::default(),
        );
        let window = ReportWindow::new(
            fixture_window().start + chrono::Duration::hours(23),
            fixture_window().end,
        );

        h.service.generate(window).await.unwrap();

        let keys = h.storage.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].contains("/reporte_general_2025-01-06_"));
    }

    #[tokio::test]
    async fn test_photos_render_when_fetchable() {
        let photo = image(Some("PINTURA"), 0);
        let fetcher = StaticImageFetcher::default().with(&photo.url, png_bytes(64, 48));
        let repository = Arc::new(InMemoryReportRepository::with_records(vec![common_record(
            vec![photo],
        )]));
        let storage = Arc::new(MemoryStorage::default());

        let service = WeeklyReportService::new(
            repository.clone(),
            storage.clone(),
            Arc::new(RecordingEmailSender::default()),
            Arc::new(fetcher),
            CompanyConfig::default(),
            &ReportConfig {
                image_fetch_timeout: Duration::from_secs(1),
                max_image_edge_px: 256,
            },
        );

        let summary = service.generate(fixture_window()).await.unwrap();
        assert_eq!(summary.reports_generated(), 1);
        assert_eq!(storage.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_access_to_reports() {
        let own = department("101", None);
        let other = department("202", None);
        let records = vec![
            common_record(vec![]),
            department_record(&own, vec![]),
            department_record(&other, vec![]),
        ];
        let h = harness(
            InMemoryReportRepository::with_records(records),
            MemoryStorage::default(),
        );
        let summary = h.service.generate(fixture_window()).await.unwrap();
        assert_eq!(summary.reports_generated(), 3);

        let owner = create_owner_user(vec![own.id]);
        let (visible, total) = h
            .service
            .list(&owner, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(visible
            .iter()
            .all(|r| r.kind == ReportKind::General || r.department_id == Some(own.id)));

        let (_, total) = h
            .service
            .list(&create_admin_user(), &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 3);

        let foreign = summary
            .reports
            .iter()
            .find(|r| r.report.department_id == Some(other.id))
            .unwrap();
        assert!(matches!(
            h.service.get(&owner, foreign.report.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.get(&owner, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_report_is_not_found() {
        let h = harness(InMemoryReportRepository::default(), MemoryStorage::default());
        assert!(matches!(
            h.service.delete(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
