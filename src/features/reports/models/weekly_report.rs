use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::model::AuthenticatedUser;

/// Report kind enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    General,
    Department,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::General => write!(f, "general"),
            ReportKind::Department => write!(f, "department"),
        }
    }
}

/// Database model for a generated report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WeeklyReport {
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

/// Data for creating a new report row
#[derive(Debug, Clone)]
pub struct CreateWeeklyReport {
    pub kind: ReportKind,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub url: String,
    pub department_id: Option<Uuid>,
}

/// Which reports a caller may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportVisibility {
    All,
    /// General reports plus reports of the listed departments
    Owner { department_ids: Vec<Uuid> },
}

impl ReportVisibility {
    pub fn for_user(user: &AuthenticatedUser) -> Self {
        if user.is_admin() {
            Self::All
        } else {
            Self::Owner {
                department_ids: user.department_ids.clone(),
            }
        }
    }

    pub fn allows(&self, report: &WeeklyReport) -> bool {
        match self {
            Self::All => true,
            Self::Owner { department_ids } => {
                report.kind == ReportKind::General
                    || report
                        .department_id
                        .is_some_and(|id| department_ids.contains(&id))
            }
        }
    }
}
