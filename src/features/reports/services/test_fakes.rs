//! In-memory collaborators and fixtures for report pipeline tests.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use printpdf::image_crate::{DynamicImage, ImageFormat, Rgb, RgbImage};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    CreateWeeklyReport, Department, MaintenanceImage, MaintenanceKind, MaintenanceRecord,
    MaintenanceScope, MaintenanceStatus, ReportVisibility, WeeklyReport,
};
use crate::features::reports::services::report_repository::ReportRepository;
use crate::features::reports::services::window::ReportWindow;
use crate::modules::email::{Delivery, EmailMessage, EmailSender};
use crate::modules::images::ImageFetcher;
use crate::modules::storage::{storage_key_from_url, ObjectStorage};
use crate::shared::types::PaginationQuery;

pub const STORAGE_BASE: &str = "https://files.example.com/condo-maintenance";

/// Wednesday of the week used throughout the fixtures
pub fn fixture_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 15, 0, 0).unwrap()
}

pub fn fixture_window() -> ReportWindow {
    ReportWindow::new(
        Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 1, 12, 23, 59, 59).unwrap() + chrono::Duration::milliseconds(999),
    )
}

pub fn image(category: Option<&str>, display_order: i32) -> MaintenanceImage {
    let id = Uuid::new_v4();
    MaintenanceImage {
        id,
        maintenance_id: Uuid::nil(),
        url: format!("https://cdn.example.com/photos/{}.jpg", id),
        storage_id: format!("photos/{}", id),
        caption: None,
        category: category.map(String::from),
        display_order,
        created_at: fixture_instant(),
    }
}

pub fn department(number: &str, owner_email: Option<&str>) -> Department {
    Department {
        id: Uuid::new_v4(),
        number: number.to_string(),
        tower: None,
        floor: Some(1),
        owner_name: Name().fake(),
        owner_email: owner_email.map(String::from),
        owner_phone: None,
        active: true,
    }
}

fn record(
    scope: MaintenanceScope,
    department: Option<&Department>,
    images: Vec<MaintenanceImage>,
) -> MaintenanceRecord {
    let id = Uuid::new_v4();
    MaintenanceRecord {
        id,
        title: Sentence(2..5).fake(),
        description: Sentence(5..12).fake(),
        kind: MaintenanceKind::Weekly,
        scope,
        department_id: department.map(|d| d.id),
        start_date: fixture_instant(),
        end_date: None,
        cost: None,
        notes: None,
        status: MaintenanceStatus::Completed,
        created_at: fixture_instant(),
        department: department.cloned(),
        images: images
            .into_iter()
            .map(|mut image| {
                image.maintenance_id = id;
                image
            })
            .collect(),
    }
}

pub fn common_record(images: Vec<MaintenanceImage>) -> MaintenanceRecord {
    record(MaintenanceScope::CommonArea, None, images)
}

pub fn department_record(
    department: &Department,
    images: Vec<MaintenanceImage>,
) -> MaintenanceRecord {
    record(MaintenanceScope::Department, Some(department), images)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 182, 122])));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png).unwrap();
    cursor.into_inner()
}

/// Serves fixed bytes per URL; unknown URLs fail like a network error
#[derive(Default)]
pub struct StaticImageFetcher {
    images: HashMap<String, Vec<u8>>,
}

impl StaticImageFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait]
impl ImageFetcher for StaticImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::ExternalServiceError(format!("connection refused: {}", url)))
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Uploads whose key contains this text fail
    fail_uploads_containing: Option<String>,
    fail_deletes: bool,
}

impl MemoryStorage {
    pub fn failing_uploads_for(fragment: &str) -> Self {
        Self {
            fail_uploads_containing: Some(fragment.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        if let Some(fragment) = &self.fail_uploads_containing {
            if key.contains(fragment.as_str()) {
                return Err(AppError::ExternalServiceError(format!(
                    "Failed to upload file '{}': bucket unavailable",
                    key
                )));
            }
        }

        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(format!("{}/{}", STORAGE_BASE, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(AppError::ExternalServiceError(format!(
                "Failed to delete file '{}': access denied",
                key
            )));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn report_key(&self, file_name: &str) -> String {
        format!("public/maintenance/reports/{}", file_name)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        storage_key_from_url(url, &[STORAGE_BASE.to_string()])
    }
}

#[derive(Default)]
pub struct InMemoryReportRepository {
    records: Mutex<Vec<MaintenanceRecord>>,
    reports: Mutex<Vec<WeeklyReport>>,
    fail_fetch: bool,
}

impl InMemoryReportRepository {
    pub fn with_records(records: Vec<MaintenanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn failing_fetch() -> Self {
        Self {
            fail_fetch: true,
            ..Default::default()
        }
    }

    pub fn reports(&self) -> Vec<WeeklyReport> {
        self.reports.lock().unwrap().clone()
    }

    fn department(&self, id: Uuid) -> Option<Department> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.department.clone())
            .find(|d| d.id == id)
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn fetch_records_in_window(
        &self,
        window: &ReportWindow,
    ) -> Result<Vec<MaintenanceRecord>> {
        if self.fail_fetch {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| window.contains(r.start_date))
            .cloned()
            .collect())
    }

    async fn create_report(&self, data: &CreateWeeklyReport) -> Result<WeeklyReport> {
        let department = data.department_id.and_then(|id| self.department(id));
        let report = WeeklyReport {
            id: Uuid::now_v7(),
            kind: data.kind,
            window_start: data.window_start,
            window_end: data.window_end,
            url: data.url.clone(),
            department_id: data.department_id,
            department_number: department.as_ref().map(|d| d.number.clone()),
            department_tower: department.and_then(|d| d.tower),
            created_at: Utc::now(),
        };
        self.reports.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn list_reports(
        &self,
        visibility: &ReportVisibility,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<WeeklyReport>, i64)> {
        let mut visible: Vec<WeeklyReport> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| visibility.allows(r))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = visible.len() as i64;
        let page = visible
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<WeeklyReport>> {
        Ok(self.reports.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn delete_report(&self, id: Uuid) -> Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|r| r.id != id);
        Ok(reports.len() < before)
    }
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery> {
        if self.fail {
            return Err(AppError::ExternalServiceError(
                "Email provider returned 503".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(Delivery::Accepted(Some(Uuid::new_v4().to_string())))
    }
}
