use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use civicbot_common::{Department, IssueType, NewReport, Priority, Report, ReportStatus};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Filters for listing reports. All present filters combine with AND;
/// `search` is a substring match over description and location text.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub issue_type: Option<IssueType>,
    pub department: Option<Department>,
    pub search: Option<String>,
}

/// Aggregate dashboard statistics over all reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    pub resolved: u64,
    pub with_image: u64,
    pub status_distribution: HashMap<String, u64>,
    pub issue_type_distribution: HashMap<String, u64>,
    pub department_distribution: HashMap<String, u64>,
    pub reports_last_7_days: u64,
    /// Mean days from creation to resolution, over reports that have a
    /// resolution timestamp. 0.0 when there are none.
    pub avg_resolution_days: f64,
}

/// The report lifecycle manager. All durable state flows through here.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new report with status `received` and a fresh id.
    /// Persistence failures surface as errors — creation never fails silently.
    async fn create(&self, new: NewReport) -> Result<i64>;

    async fn get(&self, id: i64) -> Result<Option<Report>>;

    /// Filtered, paginated listing ordered by `created_at` descending.
    /// Pages are 1-based. Returns the page plus the total match count.
    async fn list(
        &self,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Report>, u64)>;

    /// Apply a status transition. Returns false (not an error) when the id
    /// does not exist or the state machine forbids the move. The first
    /// transition into `resolved` stamps `resolved_at`; later re-resolutions
    /// leave the original stamp untouched.
    async fn update_status(&self, id: i64, new_status: ReportStatus) -> Result<bool>;

    /// Admin priority edit. False when the id does not exist.
    async fn set_priority(&self, id: i64, priority: Priority) -> Result<bool>;

    async fn stats(&self) -> Result<DashboardStats>;

    /// Retention cleanup: archive resolved reports created before `cutoff`.
    /// Returns the number of reports archived.
    async fn archive_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
