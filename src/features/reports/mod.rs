//! Weekly photographic maintenance reports.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/reports/generate` | Admin | Generate the reports of a week |
//! | GET | `/api/reports` | Any | List visible reports |
//! | GET | `/api/reports/{id}` | Any | Get a visible report |
//! | DELETE | `/api/reports/{id}` | Admin | Delete a report and its PDF |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{PgReportRepository, WeeklyReportService};
