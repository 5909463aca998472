use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maintenance kind enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "maintenance_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Weekly,
    Monthly,
    Emergency,
}

/// Where the work was done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "maintenance_scope", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceScope {
    CommonArea,
    Department,
}

impl std::fmt::Display for MaintenanceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceScope::CommonArea => write!(f, "common_area"),
            MaintenanceScope::Department => write!(f, "department"),
        }
    }
}

/// Lifecycle: pending -> in_progress -> completed, or -> cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Database model for a department (unit)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub number: String,
    pub tower: Option<String>,
    pub floor: Option<i32>,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub active: bool,
}

impl Department {
    /// "DEPARTAMENTO 101 - Torre B"
    pub fn destination_label(&self) -> String {
        match self.tower.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tower) => format!("DEPARTAMENTO {} - Torre {}", self.number, tower),
            None => format!("DEPARTAMENTO {}", self.number),
        }
    }
}

/// Photographic evidence attached to a maintenance record
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MaintenanceImage {
    pub id: Uuid,
    pub maintenance_id: Uuid,
    pub url: String,
    /// Identifier of the object at the storage provider
    pub storage_id: String,
    pub caption: Option<String>,
    /// Free-form category label; absent means "other"
    pub category: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Flat row of a maintenance record joined with its department
#[derive(Debug, Clone, FromRow)]
pub struct MaintenanceRecordRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: MaintenanceKind,
    pub scope: MaintenanceScope,
    pub department_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub department_number: Option<String>,
    pub department_tower: Option<String>,
    pub department_floor: Option<i32>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub department_active: Option<bool>,
}

/// A maintenance record with its department and ordered images attached
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: MaintenanceKind,
    pub scope: MaintenanceScope,
    pub department_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub department: Option<Department>,
    pub images: Vec<MaintenanceImage>,
}

impl From<MaintenanceRecordRow> for MaintenanceRecord {
    fn from(row: MaintenanceRecordRow) -> Self {
        let department = match (row.department_id, row.department_number) {
            (Some(id), Some(number)) => Some(Department {
                id,
                number,
                tower: row.department_tower,
                floor: row.department_floor,
                owner_name: row.owner_name.unwrap_or_default(),
                owner_email: row.owner_email,
                owner_phone: row.owner_phone,
                active: row.department_active.unwrap_or(true),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            kind: row.kind,
            scope: row.scope,
            department_id: row.department_id,
            start_date: row.start_date,
            end_date: row.end_date,
            cost: row.cost,
            notes: row.notes,
            status: row.status,
            created_at: row.created_at,
            department,
            images: Vec::new(),
        }
    }
}
