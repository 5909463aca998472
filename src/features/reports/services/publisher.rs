//! Upload of rendered reports, persistence of the report row and owner
//! notification; plus the administrative deletion path.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use minijinja::Value;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{CreateWeeklyReport, Department, ReportKind, WeeklyReport};
use crate::features::reports::services::report_repository::ReportRepository;
use crate::features::reports::services::window::{format_day, ReportWindow};
use crate::modules::email::{Delivery, EmailMessage, EmailSender};
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::{REPORT_CONTENT_TYPE, REPORT_EXTENSION};
use crate::shared::templates::{render_template, WEEKLY_REPORT_TEMPLATE};

const DEFAULT_BASE_NAME: &str = "reporte";

/// Normalize a file name so it carries exactly one `.pdf` extension.
pub fn canonical_pdf_name(hint: &str) -> String {
    let mut base = hint.trim();
    while base.len() >= REPORT_EXTENSION.len() {
        let split = base.len() - REPORT_EXTENSION.len();
        match base.get(split..) {
            Some(tail) if tail.eq_ignore_ascii_case(REPORT_EXTENSION) => {
                base = base[..split].trim_end();
            }
            _ => break,
        }
    }

    let base = if base.is_empty() {
        DEFAULT_BASE_NAME
    } else {
        base
    };
    format!("{}{}", base, REPORT_EXTENSION)
}

/// Object name for one upload: the canonical name with a per-upload token
/// before the extension, so no two reports ever share a stored object.
pub fn stored_file_name(hint: &str, token: Uuid) -> String {
    let canonical = canonical_pdf_name(hint);
    let stem = &canonical[..canonical.len() - REPORT_EXTENSION.len()];
    format!("{}_{}{}", stem, token.simple(), REPORT_EXTENSION)
}

/// A rendered document ready to be published
pub struct ReportArtifact {
    pub kind: ReportKind,
    pub window: ReportWindow,
    pub department: Option<Department>,
    pub file_name_hint: String,
    pub bytes: Vec<u8>,
}

/// Result of the owner notification side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub report: WeeklyReport,
    pub notification: NotificationOutcome,
}

/// The row is always deleted; storage cleanup is best effort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub storage_deleted: bool,
    pub storage_error: Option<String>,
}

pub struct ReportPublisher {
    storage: Arc<dyn ObjectStorage>,
    repository: Arc<dyn ReportRepository>,
    email: Arc<dyn EmailSender>,
    company_name: String,
}

impl ReportPublisher {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        repository: Arc<dyn ReportRepository>,
        email: Arc<dyn EmailSender>,
        company_name: String,
    ) -> Self {
        Self {
            storage,
            repository,
            email,
            company_name,
        }
    }

    /// Upload, then record the report row, then notify the owner.
    ///
    /// An upload failure is returned and no row is written. A notification
    /// failure is reported in the outcome only.
    pub async fn publish(&self, artifact: ReportArtifact) -> Result<PublishOutcome> {
        if artifact.bytes.is_empty() {
            return Err(AppError::Internal("Rendered report is empty".to_string()));
        }

        let file_name = stored_file_name(&artifact.file_name_hint, Uuid::new_v4());
        let key = self.storage.report_key(&file_name);
        let size = artifact.bytes.len();

        let url = self
            .storage
            .upload(&key, artifact.bytes, REPORT_CONTENT_TYPE)
            .await?;
        tracing::info!("Uploaded report '{}' ({} bytes)", key, size);

        let report = self
            .repository
            .create_report(&CreateWeeklyReport {
                kind: artifact.kind,
                window_start: artifact.window.start,
                window_end: artifact.window.end,
                url,
                department_id: artifact.department.as_ref().map(|d| d.id),
            })
            .await?;

        let notification = match &artifact.department {
            Some(department) => {
                self.notify_owner(department, &artifact.window, &report)
                    .await
            }
            None => NotificationOutcome::Skipped("general report".to_string()),
        };

        Ok(PublishOutcome {
            report,
            notification,
        })
    }

    async fn notify_owner(
        &self,
        department: &Department,
        window: &ReportWindow,
        report: &WeeklyReport,
    ) -> NotificationOutcome {
        let Some(to) = department
            .owner_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        else {
            return NotificationOutcome::Skipped("department has no contact email".to_string());
        };

        let start = format_day(window.local_start_date());
        let end = format_day(window.local_end_date());

        let mut ctx = HashMap::new();
        ctx.insert("recipient_name", Value::from(department.owner_name.as_str()));
        ctx.insert("window_start", Value::from(start.as_str()));
        ctx.insert("window_end", Value::from(end.as_str()));
        ctx.insert("report_url", Value::from(report.url.as_str()));
        ctx.insert("company_name", Value::from(self.company_name.as_str()));
        ctx.insert("year", Value::from(Utc::now().year()));

        let html = match render_template(WEEKLY_REPORT_TEMPLATE, &ctx) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render report email: {}", e);
                return NotificationOutcome::Failed(e.to_string());
            }
        };

        let message = EmailMessage {
            to: to.to_string(),
            subject: format!("Reporte de Mantenimiento - Semana del {}", start),
            html,
        };

        match self.email.send(&message).await {
            Ok(Delivery::Accepted(_)) => NotificationOutcome::Sent,
            Ok(Delivery::Logged) => {
                NotificationOutcome::Skipped("email delivery not configured".to_string())
            }
            Err(e) => {
                tracing::error!("Failed to email report {} to {}: {}", report.id, to, e);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Best-effort storage delete, then unconditional row delete.
    pub async fn delete(&self, report: &WeeklyReport) -> Result<DeleteOutcome> {
        let (storage_deleted, storage_error) = match self.storage.key_from_url(&report.url) {
            Some(key) => match self.storage.delete(&key).await {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::warn!("Failed to delete stored report '{}': {}", key, e);
                    (false, Some(e.to_string()))
                }
            },
            None => {
                tracing::warn!("No storage key could be derived from '{}'", report.url);
                (
                    false,
                    Some(format!("Unrecognized storage URL: {}", report.url)),
                )
            }
        };

        if !self.repository.delete_report(report.id).await? {
            return Err(AppError::NotFound(format!("Report {} not found", report.id)));
        }
        tracing::info!("Deleted report {}", report.id);

        Ok(DeleteOutcome {
            storage_deleted,
            storage_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::services::test_fakes::{
        department, InMemoryReportRepository, MemoryStorage, RecordingEmailSender,
    };
    use chrono::TimeZone;

    fn window() -> ReportWindow {
        ReportWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 6, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 13, 5, 59, 59).unwrap(),
        )
    }

    fn artifact(department: Option<Department>, hint: &str) -> ReportArtifact {
        ReportArtifact {
            kind: if department.is_some() {
                ReportKind::Department
            } else {
                ReportKind::General
            },
            window: window(),
            department,
            file_name_hint: hint.to_string(),
            bytes: b"%PDF-1.3 test".to_vec(),
        }
    }

    fn publisher(
        storage: Arc<MemoryStorage>,
        repository: Arc<InMemoryReportRepository>,
        email: Arc<RecordingEmailSender>,
    ) -> ReportPublisher {
        ReportPublisher::new(storage, repository, email, "Grupo Ingcor".to_string())
    }

    #[test]
    fn test_canonical_name_has_single_extension() {
        assert_eq!(canonical_pdf_name("report"), "report.pdf");
        assert_eq!(canonical_pdf_name("report.pdf"), "report.pdf");
        assert_eq!(canonical_pdf_name("report.PDF"), "report.pdf");
        assert_eq!(canonical_pdf_name("report.pdf.pdf"), "report.pdf");
        assert_eq!(canonical_pdf_name("  reporte_general_2025-01-06 "), "reporte_general_2025-01-06.pdf");
        assert_eq!(canonical_pdf_name(".pdf"), "reporte.pdf");
        assert_eq!(canonical_pdf_name(""), "reporte.pdf");
        assert_eq!(canonical_pdf_name("depto ñ.Pdf"), "depto ñ.pdf");
    }

    #[test]
    fn test_stored_name_is_unique_per_token() {
        let token = Uuid::parse_str("0194b7a2-3c4d-7e5f-8a9b-0c1d2e3f4a5b").unwrap();
        assert_eq!(
            stored_file_name("reporte_general_2025-01-06.PDF", token),
            "reporte_general_2025-01-06_0194b7a23c4d7e5f8a9b0c1d2e3f4a5b.pdf"
        );
        assert_eq!(
            stored_file_name("", token),
            "reporte_0194b7a23c4d7e5f8a9b0c1d2e3f4a5b.pdf"
        );
        assert_ne!(
            stored_file_name("reporte_depto_101", Uuid::new_v4()),
            stored_file_name("reporte_depto_101", Uuid::new_v4())
        );
    }

    #[tokio::test]
    async fn test_same_hint_never_overwrites() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let publisher = publisher(
            storage.clone(),
            repository.clone(),
            Arc::new(RecordingEmailSender::default()),
        );

        let first = publisher
            .publish(artifact(None, "reporte_general_2025-01-06"))
            .await
            .unwrap();
        let second = publisher
            .publish(artifact(None, "reporte_general_2025-01-06"))
            .await
            .unwrap();

        assert_ne!(first.report.url, second.report.url);
        assert_eq!(storage.keys().len(), 2);

        publisher.delete(&first.report).await.unwrap();
        assert_eq!(storage.keys().len(), 1);
        assert_eq!(repository.reports().len(), 1);
        assert_eq!(repository.reports()[0].url, second.report.url);
    }

    #[tokio::test]
    async fn test_publish_uploads_then_records_and_notifies() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let email = Arc::new(RecordingEmailSender::default());
        let publisher = publisher(storage.clone(), repository.clone(), email.clone());

        let owner = department("101", Some("owner@example.com"));
        let outcome = publisher
            .publish(artifact(Some(owner.clone()), "reporte_depto_101_2025-01-06.PDF"))
            .await
            .unwrap();

        assert_eq!(outcome.notification, NotificationOutcome::Sent);
        assert_eq!(outcome.report.department_id, Some(owner.id));
        let keys = storage.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("public/maintenance/reports/reporte_depto_101_2025-01-06_"));
        assert!(keys[0].ends_with(".pdf") && !keys[0].ends_with(".pdf.pdf"));
        assert_eq!(repository.reports().len(), 1);

        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert!(sent[0].subject.starts_with("Reporte de Mantenimiento - Semana del "));
        let escaped_url = outcome.report.url.replace('/', "&#x2f;");
        assert!(sent[0].html.contains(&escaped_url));
    }

    #[tokio::test]
    async fn test_upload_failure_creates_no_row() {
        let storage = Arc::new(MemoryStorage::failing_uploads_for("reporte_depto_101"));
        let repository = Arc::new(InMemoryReportRepository::default());
        let email = Arc::new(RecordingEmailSender::default());
        let publisher = publisher(storage, repository.clone(), email.clone());

        let result = publisher
            .publish(artifact(
                Some(department("101", Some("owner@example.com"))),
                "reporte_depto_101_2025-01-06",
            ))
            .await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        assert!(repository.reports().is_empty());
        assert!(email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_email_failure_keeps_report() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let email = Arc::new(RecordingEmailSender::failing());
        let publisher = publisher(storage, repository.clone(), email);

        let outcome = publisher
            .publish(artifact(
                Some(department("101", Some("owner@example.com"))),
                "reporte_depto_101_2025-01-06",
            ))
            .await
            .unwrap();

        assert!(matches!(outcome.notification, NotificationOutcome::Failed(_)));
        assert_eq!(repository.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_without_email_is_skipped() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let email = Arc::new(RecordingEmailSender::default());
        let publisher = publisher(storage, repository, email.clone());

        let outcome = publisher
            .publish(artifact(Some(department("202", None)), "reporte_depto_202"))
            .await
            .unwrap();

        assert!(matches!(outcome.notification, NotificationOutcome::Skipped(_)));
        assert!(email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_buffer_is_rejected() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let publisher = publisher(
            storage.clone(),
            repository,
            Arc::new(RecordingEmailSender::default()),
        );

        let mut empty = artifact(None, "reporte_general");
        empty.bytes.clear();

        assert!(matches!(
            publisher.publish(empty).await,
            Err(AppError::Internal(_))
        ));
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_row_even_when_storage_fails() {
        let storage = Arc::new(MemoryStorage::failing_deletes());
        let repository = Arc::new(InMemoryReportRepository::default());
        let publisher = publisher(
            storage.clone(),
            repository.clone(),
            Arc::new(RecordingEmailSender::default()),
        );

        let published = publisher
            .publish(artifact(None, "reporte_general_2025-01-06"))
            .await
            .unwrap();

        let outcome = publisher.delete(&published.report).await.unwrap();
        assert!(!outcome.storage_deleted);
        assert!(outcome.storage_error.is_some());
        assert!(repository.reports().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_stored_object() {
        let storage = Arc::new(MemoryStorage::default());
        let repository = Arc::new(InMemoryReportRepository::default());
        let publisher = publisher(
            storage.clone(),
            repository.clone(),
            Arc::new(RecordingEmailSender::default()),
        );

        let published = publisher
            .publish(artifact(None, "reporte_general_2025-01-06"))
            .await
            .unwrap();

        let outcome = publisher.delete(&published.report).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                storage_deleted: true,
                storage_error: None
            }
        );
        assert!(storage.keys().is_empty());
        assert!(repository.reports().is_empty());
    }
}
